//! Initialization, lifecycle and presentation errors.

use crate::common::ErrorSeverity;
use crate::{ComputeError, ValidationError};

/// Errors that abort engine initialization.
///
/// Initialization never leaves workers running when it returns one of these.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// The requested configuration is invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),

    /// A pipeline shader is neither registered nor loadable
    #[error("Required shader '{0}' is not available")]
    MissingShader(String),

    /// The compute backend failed while loading shaders
    #[error(transparent)]
    Compute(#[from] ComputeError),

    /// Shader files could not be read
    #[error("Failed to read shader '{name}': {source}")]
    ShaderIo {
        /// Shader name
        name: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors from starting or stopping the pipeline workers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// `start` was called while the workers are running
    #[error("Pipeline is already running")]
    AlreadyRunning,

    /// A previous worker failure left the pipeline without its queues
    #[error("Pipeline cannot be restarted: {0}")]
    NotRestartable(String),

    /// The OS refused to spawn a worker thread
    #[error("Failed to spawn worker '{name}': {reason}")]
    ThreadSpawn {
        /// Worker thread name
        name: &'static str,
        /// OS-provided reason
        reason: String,
    },

    /// A worker thread panicked
    #[error("Worker '{0}' panicked")]
    WorkerPanicked(&'static str),
}

impl PipelineError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PipelineError::AlreadyRunning => ErrorSeverity::Warning,
            PipelineError::NotRestartable(_) | PipelineError::WorkerPanicked(_) => {
                ErrorSeverity::Critical
            }
            PipelineError::ThreadSpawn { .. } => ErrorSeverity::Error,
        }
    }
}

/// Errors reported by a display sink.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresentError {
    /// The presentation surface went away
    #[error("Presentation surface lost")]
    SurfaceLost,

    /// The sink did not accept the frame in time
    #[error("Presentation timed out")]
    Timeout,

    /// Sink-specific failure
    #[error("Display sink failure: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_panic_is_critical() {
        assert_eq!(
            PipelineError::WorkerPanicked("framegen-present").severity(),
            ErrorSeverity::Critical
        );
        assert_eq!(
            PipelineError::AlreadyRunning.severity(),
            ErrorSeverity::Warning
        );
    }

    #[test]
    fn test_missing_shader_display() {
        let err = InitError::MissingShader("frame_blend".into());
        assert_eq!(
            err.to_string(),
            "Required shader 'frame_blend' is not available"
        );
    }
}
