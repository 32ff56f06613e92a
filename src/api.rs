//! Versioned external representation of tree data.
//!
//! Every constructor takes one captured snapshot, so a response is always
//! assembled from a single tree even while a rebuild swaps in a new one.

use crate::broker::Message;
use crate::error::ApiError;
use crate::render::{DocRenderer, LinkContext, API_TREE_PREFIX};
use crate::search::SearchConfig;
use crate::tree::node::Node;
use crate::tree::NodeTree;
use crate::types::{hash_hex, parse_hash_hex, Hash};
use serde::{Deserialize, Serialize};

pub const PROJECT_NAME: &str = "dsk";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiHello {
    pub hello: String,
    pub project: String,
    pub version: String,
}

impl ApiHello {
    pub fn new(tree: &NodeTree) -> Self {
        let project = tree
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            hello: PROJECT_NAME.to_string(),
            project,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Reference to a node; look the URL up for anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRefNode {
    pub url: String,
    pub title: String,
}

impl From<&Node> for ApiRefNode {
    fn from(node: &Node) -> Self {
        Self {
            url: node.url().to_string(),
            title: node.title().to_string(),
        }
    }
}

/// Light top-down view of a subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiTreeNode {
    pub hash: String,
    pub url: String,
    pub children: Vec<ApiTreeNode>,
    pub title: String,
}

impl ApiTreeNode {
    pub fn new(tree: &NodeTree, node: &Node) -> Self {
        Self {
            hash: hash_hex(node.hash()),
            url: node.url().to_string(),
            children: node
                .children(tree)
                .into_iter()
                .map(|child| ApiTreeNode::new(tree, child))
                .collect(),
            title: node.title().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiNodeTree {
    pub hash: String,
    pub root: ApiTreeNode,
    pub total: usize,
}

impl ApiNodeTree {
    pub fn new(tree: &NodeTree) -> Self {
        Self {
            hash: hash_hex(tree.hash()),
            root: ApiTreeNode::new(tree, tree.root()),
            total: tree.total_nodes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiNodeAuthor {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiNodeDoc {
    pub title: String,
    pub html: String,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiNodeAsset {
    pub url: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiNode {
    pub hash: String,
    pub url: String,
    pub parent: Option<ApiRefNode>,
    pub children: Vec<ApiRefNode>,
    pub title: String,
    pub description: String,
    pub authors: Vec<ApiNodeAuthor>,
    /// Unix seconds; 0 when undetermined.
    pub modified: i64,
    pub version: String,
    pub tags: Vec<String>,
    pub docs: Vec<ApiNodeDoc>,
    pub downloads: Vec<ApiNodeAsset>,
    pub crumbs: Vec<ApiRefNode>,
    pub related: Vec<ApiRefNode>,
    pub prev: Option<ApiRefNode>,
    pub next: Option<ApiRefNode>,
}

impl ApiNode {
    /// Full view of `node`. A document that fails to render fails the read.
    pub fn new(tree: &NodeTree, node: &Node, renderer: &dyn DocRenderer) -> Result<Self, ApiError> {
        let ctx = LinkContext {
            prefix: API_TREE_PREFIX,
            node_url: node.url(),
            lookup: tree,
        };
        let docs = node
            .docs()
            .iter()
            .map(|doc| {
                let html = renderer
                    .render(doc.raw(), &ctx)
                    .map_err(|e| ApiError::RenderFailed {
                        doc: doc.path().display().to_string(),
                        reason: e.to_string(),
                    })?;
                Ok(ApiNodeDoc {
                    title: doc.title(),
                    html,
                    raw: String::from_utf8_lossy(doc.raw()).into_owned(),
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        let (prev, next) = tree.neighbor_nodes(node)?;

        Ok(Self {
            hash: hash_hex(node.hash()),
            url: node.url().to_string(),
            parent: node.parent(tree).map(ApiRefNode::from),
            children: node.children(tree).into_iter().map(ApiRefNode::from).collect(),
            title: node.title().to_string(),
            description: node.description().to_string(),
            authors: node
                .authors(tree.authors())
                .into_iter()
                .map(|a| ApiNodeAuthor {
                    email: a.email,
                    name: a.name,
                })
                .collect(),
            modified: node.modified().map_or(0, |m| m.timestamp()),
            version: node.version().to_string(),
            tags: node.tags().to_vec(),
            docs,
            downloads: node
                .downloads()
                .iter()
                .map(|a| ApiNodeAsset {
                    url: a.url().to_string(),
                    name: a.name().to_string(),
                })
                .collect(),
            crumbs: node.crumb_nodes(tree).into_iter().map(ApiRefNode::from).collect(),
            related: node.related(tree).into_iter().map(ApiRefNode::from).collect(),
            prev: prev.map(ApiRefNode::from),
            next: next.map(ApiRefNode::from),
        })
    }

    /// Look up `url` and build its view; unknown URLs are `NodeNotFound`.
    pub fn lookup(tree: &NodeTree, url: &str, renderer: &dyn DocRenderer) -> Result<Self, ApiError> {
        let node = tree
            .get(url)?
            .ok_or_else(|| ApiError::NodeNotFound(url.to_string()))?;
        Self::new(tree, node, renderer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSearchResults {
    pub urls: Vec<String>,
    pub total: usize,
    /// Nanoseconds.
    pub took: u64,
}

impl ApiSearchResults {
    /// Run `query`, keeping at most `limit` URLs (default from config).
    pub fn new(tree: &NodeTree, query: &str, limit: Option<usize>, config: &SearchConfig) -> Self {
        let results = tree.search(query);
        let limit = limit.unwrap_or(config.max_results);
        Self {
            urls: results
                .nodes
                .iter()
                .take(limit)
                .map(|n| n.url().to_string())
                .collect(),
            total: results.total,
            took: u64::try_from(results.took.as_nanos()).unwrap_or(u64::MAX),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl From<&Message> for ApiMessage {
    fn from(message: &Message) -> Self {
        Self {
            kind: message.kind().to_string(),
            text: message.text().to_string(),
        }
    }
}

/// Whether a client's cached token still matches `hash`.
///
/// Accepts the bare hex digest or an entity tag, quoted and optionally
/// weak (`W/"..."`); a comma separated list matches if any entry does.
pub fn is_fresh(if_none_match: &str, hash: &Hash) -> bool {
    if_none_match.split(',').any(|token| {
        let token = token.trim();
        let token = token.strip_prefix("W/").unwrap_or(token);
        let token = token.trim_matches('"');
        parse_hash_hex(token).is_some_and(|h| &h == hash)
    })
}
