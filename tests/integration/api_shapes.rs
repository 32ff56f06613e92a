use dsk::api::{is_fresh, ApiHello, ApiNode, ApiNodeTree, ApiSearchResults, PROJECT_NAME};
use dsk::error::ApiError;
use dsk::render::{DocRenderer, LinkContext, PlainRenderer, RenderError};
use dsk::search::SearchConfig;
use dsk::tree::NodeTree;
use dsk::types::hash_hex;

use crate::integration::support::design_system;

struct FailingRenderer;

impl DocRenderer for FailingRenderer {
    fn render(&self, _raw: &[u8], _ctx: &LinkContext<'_>) -> Result<String, RenderError> {
        Err(RenderError("renderer offline".to_string()))
    }
}

#[test]
fn hello_names_the_tree_directory() {
    let dir = design_system();
    let tree = NodeTree::build(dir.path()).unwrap();
    let hello = ApiHello::new(&tree);

    assert_eq!(hello.hello, PROJECT_NAME);
    assert_eq!(
        hello.project,
        dir.path().file_name().unwrap().to_string_lossy()
    );
    assert_eq!(hello.version, env!("CARGO_PKG_VERSION"));
}

#[test]
fn node_tree_counts_every_node() {
    let dir = design_system();
    let tree = NodeTree::build(dir.path()).unwrap();
    let shape = ApiNodeTree::new(&tree);

    assert_eq!(shape.total, 9);
    assert_eq!(shape.hash, hash_hex(tree.hash()));
    let top: Vec<_> = shape.root.children.iter().map(|c| c.url.as_str()).collect();
    assert_eq!(top, vec!["01_Basics", "02_Components"]);
    let table = &shape.root.children[1].children[1];
    assert_eq!(table.title, "Table");
    assert_eq!(table.children.len(), 2);
}

#[test]
fn node_view_links_neighbors_and_renders_docs() {
    let dir = design_system();
    let tree = NodeTree::build(dir.path()).unwrap();
    let node = ApiNode::lookup(&tree, "02_Components/Table", &PlainRenderer).unwrap();

    assert_eq!(node.title, "Table");
    assert_eq!(node.parent.as_ref().unwrap().url, "02_Components");
    assert_eq!(node.prev.as_ref().unwrap().url, "02_Components/Button");
    assert!(node.next.is_none());
    let children: Vec<_> = node.children.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(children, vec!["Paging", "Sorting"]);
    let crumbs: Vec<_> = node.crumbs.iter().map(|c| c.url.as_str()).collect();
    assert_eq!(crumbs, vec!["02_Components", "02_Components/Table"]);
    assert!(node.modified > 0);

    assert_eq!(node.docs.len(), 1);
    let html = &node.docs[0].html;
    assert!(html.contains("<a href=\"/api/v1/tree/02_Components/Button\">buttons</a>"));
    assert!(html.contains("and Missing."));
    assert!(node.docs[0].raw.starts_with("Tables display"));
}

#[test]
fn node_view_serializes_with_expected_keys() {
    let dir = design_system();
    let tree = NodeTree::build(dir.path()).unwrap();
    let node = ApiNode::lookup(&tree, "01_Basics", &PlainRenderer).unwrap();
    let json = serde_json::to_value(&node).unwrap();

    assert_eq!(json["version"], "2.1");
    assert_eq!(json["tags"][0], "basics");
    assert_eq!(json["authors"][0]["name"], "Marius Wilms");
    assert_eq!(json["related"][0]["url"], "02_Components/Table");
    assert_eq!(json["prev"], serde_json::Value::Null);
    assert_eq!(json["next"]["url"], "02_Components");
}

#[test]
fn unknown_and_unsafe_lookups() {
    let dir = design_system();
    let tree = NodeTree::build(dir.path()).unwrap();

    let err = ApiNode::lookup(&tree, "02_Components/Nope", &PlainRenderer).unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(
        ApiNode::lookup(&tree, "../outside", &PlainRenderer),
        Err(ApiError::UnsafePath(_))
    ));
}

#[test]
fn render_failure_fails_the_read() {
    let dir = design_system();
    let tree = NodeTree::build(dir.path()).unwrap();

    match ApiNode::lookup(&tree, "02_Components/Button", &FailingRenderer) {
        Err(ApiError::RenderFailed { doc, reason }) => {
            assert!(doc.ends_with("01_usage.md"));
            assert_eq!(reason, "renderer offline");
        }
        other => panic!("expected render failure, got {:?}", other),
    }
    // Nodes without documents never call the renderer.
    assert!(ApiNode::lookup(&tree, "01_Basics/02_Typography", &FailingRenderer).is_ok());
}

#[test]
fn search_results_respect_the_limit() {
    let dir = design_system();
    let tree = NodeTree::build(dir.path()).unwrap();
    let config = SearchConfig::default();

    let all = ApiSearchResults::new(&tree, "", None, &config);
    assert_eq!(all.total, 9);
    assert_eq!(all.urls.len(), 9);

    let capped = ApiSearchResults::new(&tree, "", Some(3), &config);
    assert_eq!(capped.total, 9);
    assert_eq!(capped.urls, vec!["", "01_Basics", "01_Basics/01_Colors"]);
}

#[test]
fn freshness_follows_the_tree_hash() {
    let dir = design_system();
    let tree = NodeTree::build(dir.path()).unwrap();
    let hex = hash_hex(tree.hash());

    assert!(is_fresh(&hex, tree.hash()));
    assert!(is_fresh(&format!("\"{}\"", hex), tree.hash()));
    assert!(is_fresh(&format!("\"stale\", W/\"{}\"", hex), tree.hash()));
    assert!(!is_fresh("\"stale\"", tree.hash()));
}
