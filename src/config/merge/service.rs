//! MergeService: orchestrates sources and deserializes to DskConfig.

use crate::config::sources::{environment, global_file, root_file};
use crate::config::DskConfig;
use config::{ConfigError, File};
use std::path::Path;

use super::policy;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Precedence: defaults (lowest) -> global file -> tree-root file -> environment (highest).
    pub fn load(root: &Path) -> Result<DskConfig, ConfigError> {
        let builder = policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = root_file::add_to_builder(builder, root)?;
        let builder = environment::add_to_builder(builder)?;

        builder.build()?.try_deserialize()
    }

    /// An explicit file replaces both the global and tree-root files.
    pub fn load_from_file(path: &Path) -> Result<DskConfig, ConfigError> {
        let builder = policy::builder_with_defaults()?;
        let builder = builder.add_source(File::from(path).required(true));
        let builder = environment::add_to_builder(builder)?;

        builder.build()?.try_deserialize()
    }
}
