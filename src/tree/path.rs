//! Path utilities: traversal checks, URL normalization and segment naming.

use crate::error::ApiError;
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use tracing::warn;

/// Ensure `path` resolves to `root` or somewhere below it.
///
/// Relative paths are joined onto `root`. Normalization is lexical, so the
/// target does not need to exist. A relative path may never climb out of the
/// root, whether or not `root` itself is relative. Used on anything derived
/// from untrusted input (URL segments, query strings) before touching the
/// filesystem.
pub fn check_safe(path: impl AsRef<Path>, root: impl AsRef<Path>) -> Result<PathBuf, ApiError> {
    let path = path.as_ref();
    let root = normalize_lexically(root.as_ref());

    let resolved = if path.is_absolute() {
        Some(normalize_lexically(path)).filter(|_| root.has_root())
    } else {
        let rel = normalize_lexically(path);
        let escapes = matches!(rel.components().next(), Some(Component::ParentDir));
        (!escapes).then(|| root.join(rel))
    };

    match resolved {
        Some(resolved) if resolved.starts_with(&root) => Ok(resolved),
        _ => {
            warn!(
                path = %path.display(),
                root = %root.display(),
                "Directory traversal detected, failed check"
            );
            Err(ApiError::UnsafePath(path.display().to_string()))
        }
    }
}

/// Resolve `.` and `..` without consulting the filesystem. `..` above the
/// root of an absolute path is dropped, as the OS would.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Normalize a node URL: forward slashes only, no leading, trailing or
/// repeated separators. The root node has the empty URL.
pub fn normalize_url(url: &str) -> String {
    url.replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Split a leading `<digits><sep>` ordering prefix off a segment, where
/// `<sep>` is one of `_`, `-` or `.`. A segment that would be empty after
/// stripping keeps its full name.
pub fn split_order_prefix(segment: &str) -> (Option<u64>, &str) {
    let digits = segment.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return (None, segment);
    }
    let rest = &segment[digits..];
    let mut chars = rest.chars();
    match chars.next() {
        Some('_' | '-' | '.') if !chars.as_str().is_empty() => {
            match segment[..digits].parse::<u64>() {
                Ok(order) => (Some(order), chars.as_str()),
                Err(_) => (None, segment),
            }
        }
        _ => (None, segment),
    }
}

/// Display title of a raw path segment.
pub fn title_of(segment: &str) -> String {
    split_order_prefix(segment).1.to_string()
}

/// Whether any segment of the relative `path` matches `pattern`.
pub fn any_segment_matches(path: &Path, pattern: &Regex) -> bool {
    path.components().any(|component| match component {
        Component::Normal(name) => pattern.is_match(&name.to_string_lossy()),
        _ => false,
    })
}

/// Path relative to `root` as a normalized node URL.
pub fn url_of(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let joined = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");
    normalize_url(&joined)
}
