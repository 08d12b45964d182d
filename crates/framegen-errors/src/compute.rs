//! Compute-backend errors.
//!
//! A rejected dispatch aborts the stage that issued it; stages never
//! substitute a default result for missing GPU output.

use crate::common::{ErrorCategory, ErrorSeverity};

/// Errors reported by a compute backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComputeError {
    /// The named pipeline was dispatched before its shader was loaded
    #[error("Shader for pipeline '{pipeline}' is not loaded")]
    ShaderNotLoaded {
        /// Pipeline name
        pipeline: String,
    },

    /// Shader bytecode failed validation
    #[error("Invalid bytecode for shader '{name}': {reason}")]
    InvalidBytecode {
        /// Shader name
        name: String,
        /// Why the module was rejected
        reason: String,
    },

    /// The backend refused the dispatch
    #[error("Dispatch of '{pipeline}' rejected: {reason}")]
    DispatchRejected {
        /// Pipeline name
        pipeline: String,
        /// Backend-provided reason
        reason: String,
    },

    /// Group counts with a zero dimension
    #[error("Dispatch of '{pipeline}' has an empty group grid")]
    EmptyDispatch {
        /// Pipeline name
        pipeline: String,
    },

    /// A bound resource does not match the pass's declared extent
    #[error("Binding '{binding}' of '{pipeline}' holds {actual} elements, expected {expected}")]
    BindingSize {
        /// Pipeline name
        pipeline: String,
        /// Binding name
        binding: &'static str,
        /// Expected element count
        expected: usize,
        /// Actual element count
        actual: usize,
    },

    /// The device is gone; nothing more can be dispatched
    #[error("Compute device lost")]
    DeviceLost,
}

impl ComputeError {
    /// Create a dispatch rejection.
    pub fn rejected(pipeline: impl Into<String>, reason: impl Into<String>) -> Self {
        ComputeError::DispatchRejected {
            pipeline: pipeline.into(),
            reason: reason.into(),
        }
    }

    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ComputeError::ShaderNotLoaded { .. } | ComputeError::InvalidBytecode { .. } => {
                ErrorCategory::BackendUnavailable
            }
            _ => ErrorCategory::Compute,
        }
    }

    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ComputeError::DeviceLost => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }
}
