//! Motion and optical-flow estimation errors.

use crate::common::{ErrorCategory, ErrorSeverity};
use crate::{ComputeError, InterpolationError, ValidationError};

/// Errors from motion estimation and optical flow.
///
/// A failed estimate never yields a partial or zero field.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MotionError {
    /// The input frames or planes are unusable
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A dispatch was rejected
    #[error(transparent)]
    Compute(#[from] ComputeError),
}

impl MotionError {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            MotionError::Validation(_) => ErrorCategory::Validation,
            MotionError::Compute(e) => e.category(),
        }
    }

    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            MotionError::Validation(e) => e.severity(),
            MotionError::Compute(e) => e.severity(),
        }
    }
}

impl From<MotionError> for InterpolationError {
    fn from(err: MotionError) -> Self {
        match err {
            MotionError::Validation(e) => InterpolationError::Validation(e),
            MotionError::Compute(e) => InterpolationError::Compute(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_into_interpolation_error() {
        let err = MotionError::from(ComputeError::DeviceLost);
        assert_eq!(err.category(), ErrorCategory::Compute);
        let interp: InterpolationError = err.into();
        assert!(matches!(interp, InterpolationError::Compute(ComputeError::DeviceLost)));
    }
}
