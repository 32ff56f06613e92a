//! Lowest-precedence layer: the built-in defaults.

use crate::config::DskConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// A builder seeded with every default value, so later layers only need to
/// name the keys they change.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&DskConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}
