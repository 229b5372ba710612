// ============================================================================
// Numeric Errors
// Error types for tick arithmetic operations
// ============================================================================

use thiserror::Error;

/// Errors that can occur during tick arithmetic operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum NumericError {
    /// Result exceeded i64::MAX
    #[error("arithmetic overflow: result exceeded maximum value")]
    Overflow,
    /// Result below i64::MIN
    #[error("arithmetic underflow: result below minimum value")]
    Underflow,
}

/// Result type alias for numeric operations
pub type NumericResult<T> = Result<T, NumericError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            NumericError::Overflow.to_string(),
            "arithmetic overflow: result exceeded maximum value"
        );
        assert_eq!(
            NumericError::Underflow.to_string(),
            "arithmetic underflow: result below minimum value"
        );
    }
}
