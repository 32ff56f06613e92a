//! Per-directory node configuration (`index.json` / `index.yaml`).

use crate::error::BuildError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File names probed for node configuration, in order.
pub const META_FILE_NAMES: [&str; 3] = ["index.json", "index.yaml", "index.yml"];

/// Metadata parsed from node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeMeta {
    /// Email addresses of node authors.
    pub authors: Vec<String>,
    pub description: String,
    pub keywords: Vec<String>,
    /// URLs of related nodes, relative to the tree root.
    pub related: Vec<String>,
    pub tags: Vec<String>,
    /// Freeform version string.
    pub version: String,
}

impl NodeMeta {
    /// Parse `contents` according to the extension of `file`.
    pub fn parse(file: &Path, contents: &[u8]) -> Result<Self, BuildError> {
        let ext = file
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());

        let blank = contents.iter().all(u8::is_ascii_whitespace);
        match ext.as_deref() {
            Some("json") => {
                if blank {
                    return Ok(Self::default());
                }
                serde_json::from_slice(contents).map_err(|source| BuildError::MetaJson {
                    path: file.to_path_buf(),
                    source,
                })
            }
            Some("yaml" | "yml") => {
                if blank {
                    return Ok(Self::default());
                }
                serde_yaml::from_slice(contents).map_err(|source| BuildError::MetaYaml {
                    path: file.to_path_buf(),
                    source,
                })
            }
            _ => Err(BuildError::UnsupportedMeta(file.to_path_buf())),
        }
    }
}
