//! Configuration
//!
//! [`DskConfig`] is assembled from layered sources by [`ConfigLoader`]:
//! built-in defaults, the global file, the tree-root file and finally
//! `DSK__SECTION__KEY` environment variables.

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;
pub use sources::root_file::ROOT_CONFIG_FILE;

use crate::broker::BrokerConfig;
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::search::SearchConfig;
use crate::tree::builder::DEFAULT_IGNORE_PATTERN;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tree building
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Path segments matching this pattern are skipped while walking.
    #[serde(default = "default_ignore_pattern")]
    pub ignore_pattern: String,
}

fn default_ignore_pattern() -> String {
    DEFAULT_IGNORE_PATTERN.to_string()
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            ignore_pattern: default_ignore_pattern(),
        }
    }
}

/// Filesystem watching
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Quiet period after the last event before a batch is considered done
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Upper bound on how long one batch may collect events
    #[serde(default = "default_batch_window_ms")]
    pub batch_window_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_batch_window_ms() -> u64 {
    500
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            debounce_ms: default_debounce_ms(),
            batch_window_ms: default_batch_window_ms(),
        }
    }
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn batch_window(&self) -> Duration {
        Duration::from_millis(self.batch_window_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DskConfig {
    #[serde(default)]
    pub tree: TreeConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DskConfig {
    /// Reject values that would only fail later, at build or serve time.
    pub fn validate(&self) -> Result<(), ApiError> {
        Regex::new(&self.tree.ignore_pattern).map_err(|e| {
            ApiError::ConfigError(format!(
                "Invalid tree.ignore_pattern {:?}: {}",
                self.tree.ignore_pattern, e
            ))
        })?;
        if self.broker.inbox_capacity == 0 {
            return Err(ApiError::ConfigError(
                "broker.inbox_capacity must be at least 1".to_string(),
            ));
        }
        if self.broker.max_full_strikes == 0 {
            return Err(ApiError::ConfigError(
                "broker.max_full_strikes must be at least 1".to_string(),
            ));
        }
        let c = self.search.min_compactness;
        if !(c > 0.0 && c <= 1.0) {
            return Err(ApiError::ConfigError(format!(
                "search.min_compactness must be in (0, 1], got {}",
                c
            )));
        }
        if self.watch.batch_window_ms < self.watch.debounce_ms {
            return Err(ApiError::ConfigError(
                "watch.batch_window_ms must not be shorter than watch.debounce_ms".to_string(),
            ));
        }
        self.logging.validate()
    }
}
