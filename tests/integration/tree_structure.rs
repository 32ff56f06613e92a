use dsk::error::{ApiError, BuildError};
use dsk::tree::node::Crumb;
use dsk::tree::{NodeTree, TreeBuilder};

use crate::integration::support::{design_system, write};

fn urls<'a>(nodes: impl IntoIterator<Item = &'a dsk::tree::node::Node>) -> Vec<&'a str> {
    nodes.into_iter().map(|n| n.url()).collect()
}

#[test]
fn ignored_segments_are_skipped_everywhere() {
    let dir = design_system();
    let tree = NodeTree::build(dir.path()).unwrap();

    assert_eq!(tree.total_nodes(), 9);
    assert_eq!(tree.walk().count(), 9);
    assert!(tree.get(".git").unwrap().is_none());
    assert!(tree.get("_drafts/Secret").unwrap().is_none());
    assert!(tree.get("node_modules/pkg").unwrap().is_none());
}

#[test]
fn siblings_follow_numeric_prefix_order() {
    let dir = design_system();
    let tree = NodeTree::build(dir.path()).unwrap();

    assert_eq!(
        urls(tree.root().children(&tree)),
        vec!["01_Basics", "02_Components"]
    );
    let table = tree.get("02_Components/Table").unwrap().unwrap();
    assert_eq!(
        table.child_urls(),
        &["02_Components/Table/2_Paging", "02_Components/Table/10_Sorting"]
    );
    let titles: Vec<_> = table.children(&tree).iter().map(|n| n.title()).collect();
    assert_eq!(titles, vec!["Paging", "Sorting"]);
}

#[test]
fn walk_is_depth_first_in_sibling_order() {
    let dir = design_system();
    let tree = NodeTree::build(dir.path()).unwrap();
    assert_eq!(
        urls(tree.walk()),
        vec![
            "",
            "01_Basics",
            "01_Basics/01_Colors",
            "01_Basics/02_Typography",
            "02_Components",
            "02_Components/Button",
            "02_Components/Table",
            "02_Components/Table/2_Paging",
            "02_Components/Table/10_Sorting",
        ]
    );
}

#[test]
fn neighbors_within_sibling_lists() {
    let dir = design_system();
    let tree = NodeTree::build(dir.path()).unwrap();

    let (prev, next) = tree.neighbor_nodes(tree.root()).unwrap();
    assert!(prev.is_none() && next.is_none());

    let paging = tree.get("02_Components/Table/2_Paging").unwrap().unwrap();
    let (prev, next) = tree.neighbor_nodes(paging).unwrap();
    assert!(prev.is_none());
    assert_eq!(next.unwrap().url(), "02_Components/Table/10_Sorting");

    let sorting = tree.get("02_Components/Table/10_Sorting").unwrap().unwrap();
    let (prev, next) = tree.neighbor_nodes(sorting).unwrap();
    assert_eq!(prev.unwrap().url(), "02_Components/Table/2_Paging");
    assert!(next.is_none());
}

#[test]
fn crumbs_keep_raw_urls_and_strip_titles() {
    let dir = design_system();
    let tree = NodeTree::build(dir.path()).unwrap();
    let colors = tree.get("01_Basics/01_Colors").unwrap().unwrap();

    assert_eq!(
        colors.crumbs(),
        vec![
            Crumb {
                url: "01_Basics".to_string(),
                title: "Basics".to_string()
            },
            Crumb {
                url: "01_Basics/01_Colors".to_string(),
                title: "Colors".to_string()
            },
        ]
    );
    assert_eq!(
        urls(colors.crumb_nodes(&tree)),
        vec!["01_Basics", "01_Basics/01_Colors"]
    );
    assert!(tree.root().crumbs().is_empty());
}

#[test]
fn metadata_authors_and_related_are_resolved() {
    let dir = design_system();
    let tree = NodeTree::build(dir.path()).unwrap();
    let basics = tree.get("01_Basics").unwrap().unwrap();

    assert_eq!(basics.description(), "Foundations");
    assert_eq!(basics.tags(), &["basics"]);
    assert_eq!(basics.version(), "2.1");

    let authors = basics.authors(tree.authors());
    assert_eq!(authors.len(), 2);
    assert_eq!(authors[0].name, "Marius Wilms");
    assert_eq!(authors[1].name, "ghost@example.org");
    assert_eq!(authors[1].email, "ghost@example.org");

    assert_eq!(urls(basics.related(&tree)), vec!["02_Components/Table"]);
    assert_eq!(tree.authors().len(), 2);
}

#[test]
fn docs_and_downloads_are_classified() {
    let dir = design_system();
    let tree = NodeTree::build(dir.path()).unwrap();
    let button = tree.get("02_Components/Button").unwrap().unwrap();

    let titles: Vec<_> = button.docs().iter().map(|d| d.title()).collect();
    assert_eq!(titles, vec!["usage", "api"]);
    assert_eq!(button.downloads().len(), 1);
    assert_eq!(button.downloads()[0].url(), "02_Components/Button/button.sketch");

    let asset = tree.asset("02_Components/Button/button.sketch").unwrap();
    assert_eq!(asset.name(), "button.sketch");
    assert!(tree
        .asset("02_Components/Button/missing.pdf")
        .unwrap_err()
        .is_not_found());

    // Configuration and the author registry are not downloads.
    assert!(tree.root().downloads().is_empty());
    assert!(button.modified().is_some());
}

#[test]
fn lookups_are_normalized_and_checked() {
    let dir = design_system();
    let tree = NodeTree::build(dir.path()).unwrap();

    assert!(tree.get("/02_Components//Table/").unwrap().is_some());
    assert!(tree.get("02_Components/Nope").unwrap().is_none());
    assert!(matches!(
        tree.get("../../etc/passwd"),
        Err(ApiError::UnsafePath(_))
    ));
}

#[test]
fn root_hash_is_tree_hash() {
    let dir = design_system();
    let tree = NodeTree::build(dir.path()).unwrap();
    assert_eq!(tree.hash(), tree.root().hash());
}

#[test]
fn malformed_metadata_fails_the_whole_build() {
    let dir = design_system();
    write(dir.path(), "02_Components/Table/10_Sorting/index.yaml", "tags: [unclosed");
    let err = NodeTree::build(dir.path()).err().unwrap();
    assert!(matches!(err, BuildError::MetaYaml { .. }));
}

#[test]
fn malformed_author_registry_fails_the_build() {
    let dir = design_system();
    write(dir.path(), "AUTHORS.txt", "Just A Name\n");
    assert!(matches!(
        NodeTree::build(dir.path()),
        Err(BuildError::Authors { line: 1, .. })
    ));
}

#[test]
fn custom_ignore_pattern() {
    let dir = design_system();
    let tree = TreeBuilder::new(dir.path())
        .with_ignore_pattern(r"^[._]|^node_modules$|^Table$")
        .unwrap()
        .build()
        .unwrap();
    assert!(tree.get("02_Components/Table").unwrap().is_none());
    assert_eq!(tree.total_nodes(), 6);
}
