//! Environment variable source: DSK__ prefix with __ separator

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment};

/// Add environment variable overlay to builder, e.g.
/// `DSK__BROKER__INBOX_CAPACITY=64`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix("DSK")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    ))
}
