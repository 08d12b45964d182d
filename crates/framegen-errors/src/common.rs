//! Top-level error type and classification shared by all FrameGen crates.

use core::fmt;

use crate::{
    ComputeError, ConfigError, InferenceError, InitError, InterpolationError, MotionError,
    PipelineError, PresentError, ValidationError,
};

/// Top-level error type wrapping every FrameGen sub-error.
#[derive(Debug, thiserror::Error)]
pub enum FrameGenError {
    /// Compute backend errors
    #[error("Compute error: {0}")]
    Compute(#[from] ComputeError),

    /// Motion estimation errors
    #[error("Motion error: {0}")]
    Motion(#[from] MotionError),

    /// Frame synthesis errors
    #[error("Interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),

    /// Neural inference errors
    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    /// Startup errors
    #[error("Initialization error: {0}")]
    Init(#[from] InitError),

    /// Worker lifecycle errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Display sink errors
    #[error("Present error: {0}")]
    Present(#[from] PresentError),

    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameGenError {
    /// Get the error category for classification.
    pub fn category(&self) -> ErrorCategory {
        match self {
            FrameGenError::Compute(e) => e.category(),
            FrameGenError::Motion(e) => e.category(),
            FrameGenError::Interpolation(e) => e.category(),
            FrameGenError::Inference(_) => ErrorCategory::BackendUnavailable,
            FrameGenError::Init(_) => ErrorCategory::Initialization,
            FrameGenError::Pipeline(_) => ErrorCategory::Lifecycle,
            FrameGenError::Present(_) => ErrorCategory::Presentation,
            FrameGenError::Config(_) => ErrorCategory::Config,
            FrameGenError::Validation(_) => ErrorCategory::Validation,
            FrameGenError::Io(_) => ErrorCategory::Io,
        }
    }

    /// Get the error severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FrameGenError::Compute(e) => e.severity(),
            FrameGenError::Motion(e) => e.severity(),
            FrameGenError::Interpolation(e) => e.severity(),
            FrameGenError::Inference(_) => ErrorSeverity::Warning,
            FrameGenError::Init(_) => ErrorSeverity::Critical,
            FrameGenError::Pipeline(e) => e.severity(),
            FrameGenError::Present(_) => ErrorSeverity::Warning,
            FrameGenError::Config(_) => ErrorSeverity::Error,
            FrameGenError::Validation(e) => e.severity(),
            FrameGenError::Io(_) => ErrorSeverity::Error,
        }
    }

    /// Check if this error is recoverable without a restart.
    pub fn is_recoverable(&self) -> bool {
        self.severity() < ErrorSeverity::Critical
    }
}

/// Error category for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// A bounded resource (a queue) was full
    ResourceExhaustion = 0,
    /// An operation did not finish inside its time budget
    BudgetExceeded = 1,
    /// An optional backend (model, shader) is missing
    BackendUnavailable = 2,
    /// The device is too hot to keep the current quality
    ThermalCritical = 3,
    /// Startup could not complete
    Initialization = 4,
    /// The compute backend rejected work
    Compute = 5,
    /// The display sink rejected a frame
    Presentation = 6,
    /// Worker lifecycle misuse or failure
    Lifecycle = 7,
    /// Configuration errors
    Config = 8,
    /// Validation errors
    Validation = 9,
    /// I/O errors
    Io = 10,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::ResourceExhaustion => "ResourceExhaustion",
            ErrorCategory::BudgetExceeded => "BudgetExceeded",
            ErrorCategory::BackendUnavailable => "BackendUnavailable",
            ErrorCategory::ThermalCritical => "ThermalCritical",
            ErrorCategory::Initialization => "Initialization",
            ErrorCategory::Compute => "Compute",
            ErrorCategory::Presentation => "Presentation",
            ErrorCategory::Lifecycle => "Lifecycle",
            ErrorCategory::Config => "Config",
            ErrorCategory::Validation => "Validation",
            ErrorCategory::Io => "IO",
        };
        f.write_str(name)
    }
}

/// Error severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ErrorSeverity {
    /// Informational, no action required
    Info = 0,
    /// Warning, the pipeline degrades but keeps running
    Warning = 1,
    /// Error, the operation failed
    Error = 2,
    /// Critical, the pipeline cannot continue
    Critical = 3,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
