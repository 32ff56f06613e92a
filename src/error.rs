//! Error types for tree building and request-level reads.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building a snapshot. Any of these aborts the whole
/// rebuild; the previously published tree stays authoritative.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Failed parsing {path}: {source}")]
    MetaJson {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed parsing {path}: {source}")]
    MetaYaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Config not in a supported format: {0}")]
    UnsupportedMeta(PathBuf),

    #[error("Failed walking tree: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Tree root is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Invalid ignore pattern: {0}")]
    IgnorePattern(#[from] regex::Error),

    #[error("Malformed author entry on line {line}: {content}")]
    Authors { line: usize, content: String },

    #[error(
        "Directories {} and {} both map to node URL {url:?}",
        first.display(),
        second.display()
    )]
    DuplicateUrl {
        url: String,
        first: PathBuf,
        second: PathBuf,
    },
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors surfaced while answering a single read request.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No such node: {0}")]
    NodeNotFound(String),

    #[error("No such asset: {0}")]
    AssetNotFound(String),

    #[error("Unsafe path: {0}")]
    UnsafePath(String),

    #[error("Failed rendering document {doc}: {reason}")]
    RenderFailed { doc: String, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Whether the error means "nothing there" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NodeNotFound(_) | ApiError::AssetNotFound(_))
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
