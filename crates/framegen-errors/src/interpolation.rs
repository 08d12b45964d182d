//! Frame synthesis and neural-inference errors.

use crate::ComputeError;
use crate::ValidationError;
use crate::common::{ErrorCategory, ErrorSeverity};

/// Errors from a single interpolation call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InterpolationError {
    /// The synthesis finished, but later than the per-frame budget allows
    #[error("Interpolation took {elapsed_ns}ns, budget is {budget_ns}ns")]
    BudgetExceeded {
        /// Measured duration
        elapsed_ns: u64,
        /// Configured budget
        budget_ns: u64,
    },

    /// Timestep outside the open interval (0, 1)
    #[error("Timestep {0} is outside (0, 1)")]
    InvalidTimestep(f32),

    /// The source frames are unusable
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A compute dispatch failed
    #[error(transparent)]
    Compute(#[from] ComputeError),

    /// The neural backend failed during inference
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl InterpolationError {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            InterpolationError::BudgetExceeded { .. } => ErrorCategory::BudgetExceeded,
            InterpolationError::InvalidTimestep(_) | InterpolationError::Validation(_) => {
                ErrorCategory::Validation
            }
            InterpolationError::Compute(e) => e.category(),
            InterpolationError::Inference(_) => ErrorCategory::BackendUnavailable,
        }
    }

    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            InterpolationError::BudgetExceeded { .. } => ErrorSeverity::Warning,
            InterpolationError::Compute(e) => e.severity(),
            _ => ErrorSeverity::Error,
        }
    }

    /// Whether the call failed only because it ran out of time.
    pub fn is_budget_exceeded(&self) -> bool {
        matches!(self, InterpolationError::BudgetExceeded { .. })
    }
}

/// Errors from a neural inference backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InferenceError {
    /// The model could not be loaded
    #[error("Failed to load model '{path}': {reason}")]
    ModelLoad {
        /// Model path
        path: String,
        /// Loader-provided reason
        reason: String,
    },

    /// `run` was called before a model was loaded
    #[error("No model loaded")]
    NotLoaded,

    /// A required output tensor is absent
    #[error("Missing tensor '{0}'")]
    MissingTensor(String),

    /// A tensor has an unexpected shape
    #[error("Tensor '{name}' has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        /// Tensor name
        name: String,
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        actual: Vec<usize>,
    },

    /// Backend-specific failure
    #[error("Inference backend failure: {0}")]
    Backend(String),
}

impl InferenceError {
    /// Create a model load error.
    pub fn model_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        InferenceError::ModelLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
