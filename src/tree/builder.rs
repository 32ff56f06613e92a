//! Builds a complete [`NodeTree`] snapshot from a directory hierarchy.
//!
//! The walk happens once. Nodes are assembled bottom-up so that every parent
//! hash is computed from finished child hashes. Any failure aborts the whole
//! build; callers never see a partial tree.

use crate::authors::{Authors, AUTHORS_FILE_NAME};
use crate::error::BuildError;
use crate::search::{IndexDocument, SearchConfig, SearchIndex};
use crate::tree::hasher::{compute_node_hash, ChildDigest, NodeContent};
use crate::tree::meta::{NodeMeta, META_FILE_NAMES};
use crate::tree::node::{join_url, Node, NodeAsset, NodeDoc, OrderKey};
use crate::tree::path::{any_segment_matches, title_of, url_of};
use crate::tree::NodeTree;
use crate::types::{hash_hex, Hash};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Default pattern for ignored path segments: hidden and underscore-prefixed
/// entries plus dependency folders.
pub const DEFAULT_IGNORE_PATTERN: &str = r"^[._]|^node_modules$";

/// Recognized document extensions.
pub const DOC_EXTENSIONS: [&str; 2] = ["md", "markdown"];

/// Tree builder configuration and entry point.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    root: PathBuf,
    ignore: Regex,
    search: SearchConfig,
}

/// Node content gathered during the walk, before hashing.
struct Draft {
    path: PathBuf,
    url: String,
    segment: String,
    meta: NodeMeta,
    meta_raw: Option<Vec<u8>>,
    docs: Vec<NodeDoc>,
    assets: Vec<NodeAsset>,
    modified: Option<SystemTime>,
}

impl TreeBuilder {
    /// Create a builder for `root` with the default ignore pattern.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignore: Regex::new(DEFAULT_IGNORE_PATTERN).expect("default ignore pattern compiles"),
            search: SearchConfig::default(),
        }
    }

    /// Replace the ignore pattern, applied to every path segment.
    pub fn with_ignore_pattern(mut self, pattern: &str) -> Result<Self, BuildError> {
        self.ignore = Regex::new(pattern)?;
        Ok(self)
    }

    pub fn with_search_config(mut self, config: SearchConfig) -> Self {
        self.search = config;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ignore_pattern(&self) -> &Regex {
        &self.ignore
    }

    /// Walk the hierarchy and produce a fully hashed, indexed snapshot.
    pub fn build(&self) -> Result<NodeTree, BuildError> {
        let started = Instant::now();
        // Snapshots always carry an absolute root.
        let root = dunce::canonicalize(&self.root).map_err(|e| BuildError::io(&self.root, e))?;
        let root = root.as_path();
        let root_meta = std::fs::metadata(root).map_err(|e| BuildError::io(root, e))?;
        if !root_meta.is_dir() {
            return Err(BuildError::NotADirectory(root.to_path_buf()));
        }

        let authors = Authors::load(&root.join(AUTHORS_FILE_NAME))?;

        let mut dirs: Vec<PathBuf> = Vec::new();
        let mut files: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !any_segment_matches(
                        entry.path().strip_prefix(root).unwrap_or(entry.path()),
                        &self.ignore,
                    )
            });

        for entry in walker {
            let entry = entry?;
            let file_type = entry.file_type();
            if file_type.is_dir() {
                dirs.push(entry.into_path());
            } else if file_type.is_file() {
                let path = entry.into_path();
                if let Some(parent) = path.parent() {
                    files.entry(parent.to_path_buf()).or_default().push(path);
                }
            }
        }

        let mut drafts = Vec::with_capacity(dirs.len());
        for dir in dirs {
            let dir_files = files.remove(&dir).unwrap_or_default();
            let is_root = dir == root;
            drafts.push(self.draft(root, dir, dir_files, is_root)?);
        }

        let tree = assemble(root.to_path_buf(), drafts, authors, self.search)?;
        info!(
            root = %root.display(),
            nodes = tree.total_nodes(),
            hash = %hash_hex(tree.hash()),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Built tree"
        );
        Ok(tree)
    }

    fn draft(
        &self,
        root: &Path,
        dir: PathBuf,
        files: Vec<PathBuf>,
        is_root: bool,
    ) -> Result<Draft, BuildError> {
        let url = url_of(&dir, root);
        let segment = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut meta_files: Vec<(usize, PathBuf, String)> = Vec::new();
        let mut docs = Vec::new();
        let mut assets = Vec::new();
        let mut modified: Option<SystemTime> = None;

        for file in files {
            let name = match file.file_name() {
                Some(n) => n.to_string_lossy().into_owned(),
                None => continue,
            };
            if let Ok(mtime) = std::fs::metadata(&file).and_then(|m| m.modified()) {
                modified = Some(modified.map_or(mtime, |m| m.max(mtime)));
            }

            if let Some(rank) = META_FILE_NAMES.iter().position(|m| *m == name) {
                meta_files.push((rank, file, name));
                continue;
            }
            if is_root && name == AUTHORS_FILE_NAME {
                continue;
            }
            let is_doc = file
                .extension()
                .map(|e| e.to_string_lossy().to_ascii_lowercase())
                .map_or(false, |e| DOC_EXTENSIONS.contains(&e.as_str()));
            if is_doc {
                let raw = std::fs::read(&file).map_err(|e| BuildError::io(&file, e))?;
                docs.push(NodeDoc {
                    path: file,
                    name,
                    raw,
                });
            } else {
                assets.push(NodeAsset {
                    url: join_url(&url, &name),
                    path: file,
                    name,
                });
            }
        }

        // The first name in precedence order configures the node; any other
        // metadata file next to it is served as a plain asset.
        meta_files.sort_by_key(|(rank, _, _)| *rank);
        let mut meta_files = meta_files.into_iter();
        let meta_file = meta_files.next();
        for (_, file, name) in meta_files {
            warn!(
                url = %url,
                file = %file.display(),
                "Shadowed metadata file, serving it as an asset"
            );
            assets.push(NodeAsset {
                url: join_url(&url, &name),
                path: file,
                name,
            });
        }

        let (meta, meta_raw) = match meta_file {
            Some((_, file, _)) => {
                let raw = std::fs::read(&file).map_err(|e| BuildError::io(&file, e))?;
                (NodeMeta::parse(&file, &raw)?, Some(raw))
            }
            None => (NodeMeta::default(), None),
        };

        docs.sort_by(|a, b| doc_order(a).cmp(&doc_order(b)));
        assets.sort_by(|a, b| a.name.cmp(&b.name));

        debug!(url = %url, docs = docs.len(), assets = assets.len(), "Collected node");
        Ok(Draft {
            path: dir,
            url,
            segment,
            meta,
            meta_raw,
            docs,
            assets,
            modified,
        })
    }
}

fn doc_order(doc: &NodeDoc) -> OrderKey {
    let stem = Path::new(&doc.name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    OrderKey::of(&stem)
}

fn parent_url(url: &str) -> Option<String> {
    if url.is_empty() {
        return None;
    }
    Some(url.rsplit_once('/').map_or(String::new(), |(p, _)| p.to_string()))
}

/// Turn drafts (in walk pre-order) into a hashed, ordered and indexed tree.
fn assemble(
    root: PathBuf,
    drafts: Vec<Draft>,
    authors: Authors,
    search: SearchConfig,
) -> Result<NodeTree, BuildError> {
    let mut position: HashMap<String, usize> = HashMap::with_capacity(drafts.len());
    for (i, draft) in drafts.iter().enumerate() {
        if let Some(first) = position.insert(draft.url.clone(), i) {
            return Err(BuildError::DuplicateUrl {
                url: draft.url.clone(),
                first: drafts[first].path.clone(),
                second: draft.path.clone(),
            });
        }
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); drafts.len()];
    for (i, draft) in drafts.iter().enumerate() {
        if let Some(parent) = parent_url(&draft.url) {
            if let Some(&p) = position.get(&parent) {
                children[p].push(i);
            }
        }
    }
    for list in children.iter_mut() {
        list.sort_by(|a, b| {
            OrderKey::of(&drafts[*a].segment).cmp(&OrderKey::of(&drafts[*b].segment))
        });
    }

    // Pre-order reversed visits every child before its parent.
    let mut hashes: Vec<Hash> = vec![[0u8; 32]; drafts.len()];
    for i in (0..drafts.len()).rev() {
        let draft = &drafts[i];
        let doc_refs: Vec<(&str, &[u8])> = draft
            .docs
            .iter()
            .map(|d| (d.name.as_str(), d.raw.as_slice()))
            .collect();
        let asset_names: Vec<&str> = draft.assets.iter().map(|a| a.name.as_str()).collect();
        let child_digests: Vec<ChildDigest<'_>> = children[i]
            .iter()
            .map(|&c| ChildDigest {
                segment: &drafts[c].segment,
                hash: &hashes[c],
            })
            .collect();
        let hash = compute_node_hash(
            &NodeContent {
                meta: draft.meta_raw.as_deref(),
                docs: &doc_refs,
                assets: &asset_names,
            },
            &child_digests,
        );
        hashes[i] = hash;
    }

    let mut order = Vec::with_capacity(drafts.len());
    if !drafts.is_empty() {
        let mut stack = vec![0usize];
        while let Some(i) = stack.pop() {
            order.push(drafts[i].url.clone());
            stack.extend(children[i].iter().rev().copied());
        }
    }

    let child_urls: Vec<Vec<String>> = children
        .iter()
        .map(|list| list.iter().map(|&c| drafts[c].url.clone()).collect())
        .collect();

    let mut nodes: HashMap<String, Node> = HashMap::with_capacity(drafts.len());
    for (i, (draft, kids)) in drafts.into_iter().zip(child_urls).enumerate() {
        let title = title_of(&draft.segment);
        let node = Node {
            order: OrderKey::of(&draft.segment),
            parent: parent_url(&draft.url),
            children: kids,
            hash: hashes[i],
            modified: draft.modified.map(DateTime::<Utc>::from),
            path: draft.path,
            url: draft.url,
            title,
            meta: draft.meta,
            docs: draft.docs,
            assets: draft.assets,
        };
        nodes.insert(node.url.clone(), node);
    }

    let documents: Vec<IndexDocument> = order
        .iter()
        .filter_map(|url| nodes.get(url))
        .map(index_document)
        .collect();
    let index = SearchIndex::build(documents, search);

    Ok(NodeTree {
        root,
        nodes,
        order,
        authors,
        search: index,
        built_at: Utc::now(),
    })
}

fn index_document(node: &Node) -> IndexDocument {
    let mut keywords = node.meta.keywords.clone();
    if !node.meta.description.is_empty() {
        keywords.push(node.meta.description.clone());
    }
    IndexDocument {
        url: node.url.clone(),
        title: node.title.clone(),
        tags: node.meta.tags.clone(),
        keywords,
        bodies: node
            .docs
            .iter()
            .map(|d| String::from_utf8_lossy(&d.raw).into_owned())
            .collect(),
    }
}
