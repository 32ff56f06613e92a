//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::DskConfig;
use crate::error::ApiError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the tree at `root` from files and environment.
    pub fn load(root: &Path) -> Result<DskConfig, ApiError> {
        let config = MergeService::load(root)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file with environment overlay.
    pub fn load_from_file(path: &Path) -> Result<DskConfig, ApiError> {
        let config = MergeService::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }
}
