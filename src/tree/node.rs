//! Tree node types: one node per directory, plus its documents and assets.
//!
//! Nodes never hold a reference to the tree that owns them. Anything that
//! needs tree-wide context (children, parent, crumbs resolved to nodes,
//! related nodes) takes a [`NodeLookup`] argument instead.

use crate::authors::{Author, Authors};
use crate::error::ApiError;
use crate::tree::meta::NodeMeta;
use crate::tree::path::{split_order_prefix, title_of};
use crate::types::Hash;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Resolves node URLs to nodes of one snapshot.
pub trait NodeLookup {
    fn lookup(&self, url: &str) -> Option<&Node>;
}

/// Sort key derived from a raw path segment.
///
/// Segments with an ordering prefix sort before plain ones, by number and
/// then by raw name; plain segments sort by raw name. Names are unique among
/// siblings, so this is a total order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum OrderKey {
    Numbered(u64, String),
    Named(String),
}

impl OrderKey {
    pub fn of(segment: &str) -> Self {
        match split_order_prefix(segment) {
            (Some(n), _) => OrderKey::Numbered(n, segment.to_string()),
            (None, _) => OrderKey::Named(segment.to_string()),
        }
    }
}

/// One breadcrumb entry on the path from the root to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub url: String,
    pub title: String,
}

/// A document inside a node directory.
#[derive(Debug, Clone)]
pub struct NodeDoc {
    pub(crate) path: PathBuf,
    pub(crate) name: String,
    pub(crate) raw: Vec<u8>,
}

impl NodeDoc {
    /// File name including extension.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stem with any ordering prefix stripped.
    pub fn title(&self) -> String {
        let stem = Path::new(&self.name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone());
        title_of(&stem)
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A downloadable file inside a node directory.
#[derive(Debug, Clone)]
pub struct NodeAsset {
    pub(crate) path: PathBuf,
    pub(crate) name: String,
    pub(crate) url: String,
}

impl NodeAsset {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// URL of the asset relative to the tree root.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Resolvable filesystem path for serving the asset.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A node in the design documentation tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) path: PathBuf,
    pub(crate) url: String,
    pub(crate) title: String,
    pub(crate) order: OrderKey,
    pub(crate) hash: Hash,
    pub(crate) meta: NodeMeta,
    pub(crate) docs: Vec<NodeDoc>,
    pub(crate) assets: Vec<NodeAsset>,
    pub(crate) parent: Option<String>,
    pub(crate) children: Vec<String>,
    pub(crate) modified: Option<DateTime<Utc>>,
}

impl Node {
    /// Absolute filesystem path. Never exposed through the api layer.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// URL relative to the tree root; empty for the root node.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn order(&self) -> &OrderKey {
        &self.order
    }

    pub fn hash(&self) -> &Hash {
        &self.hash
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    pub fn description(&self) -> &str {
        &self.meta.description
    }

    pub fn tags(&self) -> &[String] {
        &self.meta.tags
    }

    pub fn keywords(&self) -> &[String] {
        &self.meta.keywords
    }

    pub fn version(&self) -> &str {
        &self.meta.version
    }

    pub fn docs(&self) -> &[NodeDoc] {
        &self.docs
    }

    pub fn downloads(&self) -> &[NodeAsset] {
        &self.assets
    }

    /// Newest modification time of the node's own files, if any.
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }

    /// URL of the parent node; `None` for the root.
    pub fn parent_url(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// URLs of the children, in sibling order.
    pub fn child_urls(&self) -> &[String] {
        &self.children
    }

    pub fn parent<'t>(&self, tree: &'t impl NodeLookup) -> Option<&'t Node> {
        self.parent.as_deref().and_then(|url| tree.lookup(url))
    }

    pub fn children<'t>(&self, tree: &'t impl NodeLookup) -> Vec<&'t Node> {
        self.children
            .iter()
            .filter_map(|url| tree.lookup(url))
            .collect()
    }

    /// Breadcrumb chain, one entry per URL segment. The root has none.
    ///
    /// URLs keep the raw segments, titles have ordering prefixes stripped.
    pub fn crumbs(&self) -> Vec<Crumb> {
        let mut crumbs = Vec::new();
        let mut prefix = String::new();
        for segment in self.url.split('/').filter(|s| !s.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            crumbs.push(Crumb {
                url: prefix.clone(),
                title: title_of(segment),
            });
        }
        crumbs
    }

    /// Crumbs resolved into real nodes of `tree`; unresolvable ones are skipped.
    pub fn crumb_nodes<'t>(&self, tree: &'t impl NodeLookup) -> Vec<&'t Node> {
        self.crumbs()
            .iter()
            .filter_map(|crumb| tree.lookup(&crumb.url))
            .collect()
    }

    /// Related nodes declared in the configuration that exist in `tree`.
    pub fn related<'t>(&self, tree: &'t impl NodeLookup) -> Vec<&'t Node> {
        self.meta
            .related
            .iter()
            .map(|url| crate::tree::path::normalize_url(url))
            .filter(|url| *url != self.url)
            .filter_map(|url| tree.lookup(&url))
            .collect()
    }

    /// Authors resolved against the registry. Unknown addresses are kept
    /// with the address standing in for the name.
    pub fn authors(&self, registry: &Authors) -> Vec<Author> {
        self.meta
            .authors
            .iter()
            .map(|email| {
                registry.get(email).cloned().unwrap_or_else(|| Author {
                    name: email.clone(),
                    email: email.clone(),
                })
            })
            .collect()
    }

    /// Look up a downloadable asset by file name.
    pub fn asset(&self, name: &str) -> Result<&NodeAsset, ApiError> {
        self.assets
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| ApiError::AssetNotFound(join_url(&self.url, name)))
    }
}

pub(crate) fn join_url(base: &str, segment: &str) -> String {
    if base.is_empty() {
        segment.to_string()
    } else {
        format!("{}/{}", base, segment)
    }
}
