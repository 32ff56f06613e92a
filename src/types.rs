//! Core types shared by the tree, search and api layers.

/// Hash: 256-bit blake3 digest of a node and its descendants
pub type Hash = [u8; 32];

/// Render a hash the way it appears on the wire and in logs.
pub fn hash_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Parse a hex token back into a hash, returning `None` on malformed input.
pub fn parse_hash_hex(token: &str) -> Option<Hash> {
    let bytes = hex::decode(token).ok()?;
    bytes.try_into().ok()
}
