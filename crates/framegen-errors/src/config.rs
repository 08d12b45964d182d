//! Configuration loading errors.

use crate::ValidationError;

/// Errors from reading an engine configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid YAML/JSON for the config schema
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// The parsed values are out of range
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ConfigError {
    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        ConfigError::Parse(msg.into())
    }
}
