//! Input validation error types.

use core::fmt;

use crate::common::ErrorSeverity;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Value out of range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Field name
        field: String,
        /// The invalid value
        value: String,
        /// Minimum allowed value
        min: String,
        /// Maximum allowed value
        max: String,
    },

    /// Image or field extent with a zero dimension
    #[error("Invalid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },

    /// Two inputs that must share a resolution do not
    #[error("Dimension mismatch: expected {expected_width}x{expected_height}, got {actual_width}x{actual_height}")]
    DimensionMismatch {
        /// Expected width
        expected_width: u32,
        /// Expected height
        expected_height: u32,
        /// Actual width
        actual_width: u32,
        /// Actual height
        actual_height: u32,
    },

    /// A buffer does not hold the number of elements its extent implies
    #[error("Buffer for '{field}' holds {actual} elements, expected {expected}")]
    BufferSize {
        /// Buffer name
        field: String,
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Invalid enum value
    #[error("Invalid value '{value}' for field '{field}', expected one of: {expected}")]
    InvalidEnumValue {
        /// Field name
        field: String,
        /// The invalid value
        value: String,
        /// Expected values
        expected: String,
    },

    /// Constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl ValidationError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }

    /// Create an out of range error for a numeric value.
    pub fn out_of_range<T: fmt::Debug>(field: impl Into<String>, value: T, min: T, max: T) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            value: format!("{value:?}"),
            min: format!("{min:?}"),
            max: format!("{max:?}"),
        }
    }

    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(expected: (u32, u32), actual: (u32, u32)) -> Self {
        ValidationError::DimensionMismatch {
            expected_width: expected.0,
            expected_height: expected.1,
            actual_width: actual.0,
            actual_height: actual.1,
        }
    }

    /// Create a buffer size error.
    pub fn buffer_size(field: impl Into<String>, expected: usize, actual: usize) -> Self {
        ValidationError::BufferSize {
            field: field.into(),
            expected,
            actual,
        }
    }

    /// Create an invalid enum value error.
    pub fn invalid_enum(
        field: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        ValidationError::InvalidEnumValue {
            field: field.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }

    /// Create a constraint violation error.
    pub fn constraint(msg: impl Into<String>) -> Self {
        ValidationError::ConstraintViolation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_display() {
        let err = ValidationError::out_of_range("model_scale", 2.0_f32, 0.25, 1.0);
        assert_eq!(
            err.to_string(),
            "model_scale value 2.0 is out of range [0.25, 1.0]"
        );
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let err = ValidationError::dimension_mismatch((64, 32), (32, 32));
        assert_eq!(
            err.to_string(),
            "Dimension mismatch: expected 64x32, got 32x32"
        );
    }
}
