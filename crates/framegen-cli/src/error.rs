//! Error types for the framegen CLI

use framegen_errors::{ConfigError, InitError, PipelineError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Initialization failed: {0}")]
    Init(#[from] InitError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::InvalidArgument(_) => 2,
            CliError::Config(_) => 3,
            CliError::Init(_) => 4,
            CliError::Pipeline(_) => 5,
            CliError::Json(_) => 1,
        }
    }
}
