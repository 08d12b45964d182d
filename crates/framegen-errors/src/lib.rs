//! Centralized error types for FrameGen.
//!
//! Every crate in the pipeline reports failures through the enums defined
//! here, so the control surface can classify any error the same way.
//!
//! # Architecture
//!
//! - [`common`]: Top-level [`FrameGenError`], categories and severities
//! - [`compute`]: Compute-backend dispatch and shader errors
//! - [`interpolation`]: Frame synthesis and neural-inference errors
//! - [`motion`]: Motion and optical-flow estimation errors
//! - [`pipeline`]: Initialization, lifecycle and presentation errors
//! - [`config`]: Configuration loading errors
//! - [`validation`]: Input validation errors
//!
//! # Error taxonomy
//!
//! | Category | Pipeline reaction |
//! |---|---|
//! | [`ErrorCategory::ResourceExhaustion`] | drop the frame and count it |
//! | [`ErrorCategory::BudgetExceeded`] | truncate the batch, controller lowers quality |
//! | [`ErrorCategory::BackendUnavailable`] | fall back at init, permanently |
//! | [`ErrorCategory::ThermalCritical`] | force minimum quality, keep running |
//! | [`ErrorCategory::Initialization`] | fatal to startup |
//!
//! # Example
//!
//! ```
//! use framegen_errors::prelude::*;
//!
//! fn check_quality(value: f32) -> Result<f32> {
//!     if !(0.0..=1.0).contains(&value) {
//!         return Err(ValidationError::out_of_range("quality", value, 0.0, 1.0).into());
//!     }
//!     Ok(value)
//! }
//!
//! assert!(check_quality(1.5).is_err());
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod common;
pub mod compute;
pub mod config;
pub mod interpolation;
pub mod motion;
pub mod pipeline;
pub mod prelude;
pub mod validation;

pub use common::{ErrorCategory, ErrorSeverity, FrameGenError};
pub use compute::ComputeError;
pub use config::ConfigError;
pub use interpolation::{InferenceError, InterpolationError};
pub use motion::MotionError;
pub use pipeline::{InitError, PipelineError, PresentError};
pub use validation::ValidationError;

/// A specialized `Result` type for FrameGen operations.
pub type Result<T> = std::result::Result<T, FrameGenError>;

/// A specialized `Result` type for compute dispatches.
pub type ComputeResult<T = ()> = std::result::Result<T, ComputeError>;
