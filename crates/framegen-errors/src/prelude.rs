//! Prelude module for convenient error handling imports.
//!
//! ```
//! use framegen_errors::prelude::*;
//!
//! fn stage() -> ComputeResult {
//!     Err(ComputeError::DeviceLost)
//! }
//!
//! assert!(stage().is_err());
//! ```

pub use crate::{
    ComputeResult, Result,
    common::{ErrorCategory, ErrorSeverity, FrameGenError},
    compute::ComputeError,
    config::ConfigError,
    interpolation::{InferenceError, InterpolationError},
    motion::MotionError,
    pipeline::{InitError, PipelineError, PresentError},
    validation::ValidationError,
};
