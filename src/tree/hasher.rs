//! Hash computation for tree nodes

use crate::types::Hash;

/// One child's contribution to its parent's hash.
pub struct ChildDigest<'a> {
    pub segment: &'a str,
    pub hash: &'a Hash,
}

/// Node content that participates in hashing.
pub struct NodeContent<'a> {
    /// Raw bytes of the configuration file, if any.
    pub meta: Option<&'a [u8]>,
    /// `(file name, raw body)` of each document, in document order.
    pub docs: &'a [(&'a str, &'a [u8])],
    /// Asset file names, in listing order.
    pub assets: &'a [&'a str],
}

/// Compute the hash of a node from its own content and its children.
///
/// Every field is tagged and length-prefixed so that moving bytes between
/// fields can never produce the same digest. Children must be passed in
/// sibling order.
pub fn compute_node_hash(content: &NodeContent<'_>, children: &[ChildDigest<'_>]) -> Hash {
    let mut hasher = blake3::Hasher::new();

    match content.meta {
        Some(raw) => {
            hasher.update(b"meta");
            update_framed(&mut hasher, raw);
        }
        None => {
            hasher.update(b"nometa");
        }
    }

    hasher.update(b"docs");
    hasher.update(&(content.docs.len() as u64).to_le_bytes());
    for (name, body) in content.docs {
        update_framed(&mut hasher, name.as_bytes());
        update_framed(&mut hasher, body);
    }

    hasher.update(b"assets");
    hasher.update(&(content.assets.len() as u64).to_le_bytes());
    for name in content.assets {
        update_framed(&mut hasher, name.as_bytes());
    }

    hasher.update(b"children");
    hasher.update(&(children.len() as u64).to_le_bytes());
    for child in children {
        update_framed(&mut hasher, child.segment.as_bytes());
        hasher.update(child.hash);
    }

    *hasher.finalize().as_bytes()
}

fn update_framed(hasher: &mut blake3::Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}
