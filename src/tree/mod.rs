//! Design documentation tree
//!
//! One immutable snapshot of the directory hierarchy: every node with its
//! metadata, documents, assets and hash, a flat URL index and the search
//! index built from the same content. Rebuilding produces a new snapshot;
//! [`handle::TreeHandle`] swaps it in atomically.

pub mod builder;
pub mod handle;
pub mod hasher;
pub mod meta;
pub mod node;
pub mod path;

use crate::authors::Authors;
use crate::error::{ApiError, BuildError};
use crate::search::{SearchHit, SearchIndex};
use crate::tree::node::{Node, NodeAsset, NodeLookup};
use crate::tree::path::{check_safe, normalize_url};
use crate::types::Hash;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use builder::TreeBuilder;
pub use handle::TreeHandle;

/// Ranked search results over one snapshot.
#[derive(Debug)]
pub struct SearchResults<'t> {
    pub nodes: Vec<&'t Node>,
    /// Match count before any caller-side truncation.
    pub total: usize,
    pub took: Duration,
}

/// A complete, immutable snapshot of the tree.
pub struct NodeTree {
    pub(crate) root: PathBuf,
    pub(crate) nodes: HashMap<String, Node>,
    /// URLs in depth-first sibling order, root first.
    pub(crate) order: Vec<String>,
    pub(crate) authors: Authors,
    pub(crate) search: SearchIndex,
    pub(crate) built_at: DateTime<Utc>,
}

impl NodeTree {
    /// Build a snapshot of `root` with default settings.
    pub fn build(root: impl Into<PathBuf>) -> Result<Self, BuildError> {
        TreeBuilder::new(root).build()
    }

    /// Filesystem root the snapshot was built from.
    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn root(&self) -> &Node {
        // The builder always produces the root at the empty URL.
        &self.nodes[""]
    }

    /// Tree hash; identical to the root node's hash.
    pub fn hash(&self) -> &Hash {
        self.root().hash()
    }

    pub fn total_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn authors(&self) -> &Authors {
        &self.authors
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Look up a node by URL.
    ///
    /// `Ok(None)` means the URL does not exist; an error is only returned
    /// when the input fails the traversal check.
    pub fn get(&self, url: &str) -> Result<Option<&Node>, ApiError> {
        let url = normalize_url(url);
        check_safe(&url, &self.root)?;
        Ok(self.nodes.get(&url))
    }

    /// Look up a downloadable asset by its URL (`<node url>/<file name>`).
    pub fn asset(&self, url: &str) -> Result<&NodeAsset, ApiError> {
        let url = normalize_url(url);
        check_safe(&url, &self.root)?;
        let (node_url, name) = url.rsplit_once('/').unwrap_or(("", url.as_str()));
        let node = self
            .nodes
            .get(node_url)
            .ok_or_else(|| ApiError::NodeNotFound(node_url.to_string()))?;
        node.asset(name)
    }

    /// Previous and next sibling of `node` in sort order. The root and the
    /// ends of a sibling list yield `None`.
    pub fn neighbor_nodes(&self, node: &Node) -> Result<(Option<&Node>, Option<&Node>), ApiError> {
        let Some(parent_url) = node.parent_url() else {
            return Ok((None, None));
        };
        let parent = self
            .nodes
            .get(parent_url)
            .ok_or_else(|| ApiError::NodeNotFound(parent_url.to_string()))?;
        let siblings = parent.child_urls();
        let pos = siblings
            .iter()
            .position(|u| u == node.url())
            .ok_or_else(|| ApiError::NodeNotFound(node.url().to_string()))?;

        let prev = pos
            .checked_sub(1)
            .and_then(|p| siblings.get(p))
            .and_then(|u| self.nodes.get(u));
        let next = siblings.get(pos + 1).and_then(|u| self.nodes.get(u));
        Ok((prev, next))
    }

    /// All nodes depth-first in sibling order, root first.
    pub fn walk(&self) -> impl Iterator<Item = &Node> + '_ {
        self.order.iter().filter_map(|url| self.nodes.get(url))
    }

    /// Fuzzy search over the snapshot. The empty query returns every node
    /// in tree order.
    pub fn search(&self, query: &str) -> SearchResults<'_> {
        let (hits, took) = self.search.search(query);
        let nodes: Vec<&Node> = hits
            .iter()
            .filter_map(|hit: &SearchHit| self.nodes.get(&hit.url))
            .collect();
        SearchResults {
            total: nodes.len(),
            nodes,
            took,
        }
    }

    /// Raw scored hits, for callers that want the scores.
    pub fn search_hits(&self, query: &str) -> Vec<SearchHit> {
        self.search.search(query).0
    }
}

impl NodeLookup for NodeTree {
    fn lookup(&self, url: &str) -> Option<&Node> {
        self.nodes.get(url)
    }
}
