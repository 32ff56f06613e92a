use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

pub fn mkdir(root: &Path, rel: &str) {
    fs::create_dir_all(root.join(rel)).unwrap();
}

/// A small design system:
///
/// ```text
/// AUTHORS.txt
/// index.json
/// 01_Basics/            index.yaml, readme.md
///   01_Colors/          palette.md, colors.ase
///   02_Typography/
/// 02_Components/        index.json
///   Button/             01_usage.md, 02_api.md, button.sketch
///   Table/              readme.md
///     2_Paging/
///     10_Sorting/
/// .git/  _drafts/  node_modules/   (ignored)
/// ```
pub fn design_system() -> TempDir {
    let dir = tempfile::Builder::new().prefix("dsk").tempdir().unwrap();
    let root = dir.path();

    write(
        root,
        "AUTHORS.txt",
        "# Maintainers\nChristoph Hochstrasser <christoph@atelierdisko.de>\nMarius Wilms <marius@atelierdisko.de> # lead\n",
    );
    write(root, "index.json", r#"{"description": "Acme design system"}"#);

    write(
        root,
        "01_Basics/index.yaml",
        "description: Foundations\ntags: [basics]\nauthors:\n  - marius@atelierdisko.de\n  - ghost@example.org\nrelated:\n  - 02_Components/Table\n  - /nope\nversion: \"2.1\"\n",
    );
    write(root, "01_Basics/readme.md", "The basics.");
    write(root, "01_Basics/01_Colors/palette.md", "Primary and secondary colors.");
    write(root, "01_Basics/01_Colors/colors.ase", "binary");
    mkdir(root, "01_Basics/02_Typography");

    write(root, "02_Components/index.json", r#"{"keywords": ["widgets"]}"#);
    write(root, "02_Components/Button/01_usage.md", "Press it.");
    write(root, "02_Components/Button/02_api.md", "onClick");
    write(root, "02_Components/Button/button.sketch", "sketch");
    write(
        root,
        "02_Components/Table/readme.md",
        "Tables display tabular data.\n\nSee [[/02_Components/Button|buttons]] and [[Missing]].",
    );
    mkdir(root, "02_Components/Table/2_Paging");
    mkdir(root, "02_Components/Table/10_Sorting");

    write(root, ".git/config", "[core]");
    write(root, "_drafts/Secret/readme.md", "hidden");
    write(root, "node_modules/pkg/index.json", "{ broken");

    dir
}
