//! Error types for bitmap assignment
//!
//! Provides a unified error type for all sparse-bitmap crates.
//!
//! The assignment kernels themselves only ever produce [`Error::OutOfMemory`];
//! the remaining variants are raised by the validating front door before a
//! kernel runs.

use thiserror::Error;

/// Core error type for bitmap matrix operations
#[derive(Error, Debug)]
pub enum Error {
    /// Workspace or result allocation failed (or exceeded the configured limit)
    #[error("Out of memory: could not allocate {bytes} bytes for {context}")]
    OutOfMemory { bytes: usize, context: &'static str },

    /// Matrix or index-list dimensions do not agree
    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: &'static str,
        expected: String,
        actual: String,
    },

    /// An index list refers to a position outside the target dimension
    #[error("Index {index} out of bounds for dimension {dim}")]
    IndexOutOfBounds { index: usize, dim: usize },

    /// An index list names the same position twice
    #[error("Duplicate index {index} in index list")]
    DuplicateIndex { index: usize },

    /// Invalid parameter provided to a function
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error patterns

impl Error {
    /// Create an out-of-memory error for `count` items of type `T`
    pub fn out_of_memory<T>(count: usize, context: &'static str) -> Self {
        Self::OutOfMemory {
            bytes: count.saturating_mul(std::mem::size_of::<T>()),
            context,
        }
    }

    /// Create an error for a shape mismatch between two matrices
    pub fn shape_mismatch(
        expected: (usize, usize),
        actual: (usize, usize),
        context: &'static str,
    ) -> Self {
        Self::DimensionMismatch {
            context,
            expected: format!("{}x{}", expected.0, expected.1),
            actual: format!("{}x{}", actual.0, actual.1),
        }
    }

    /// Create an error for a length mismatch
    pub fn size_mismatch(expected: usize, actual: usize, context: &'static str) -> Self {
        Self::DimensionMismatch {
            context,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// True for allocation failures
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::OutOfMemory { bytes: 64, context: "mask slicing" };
        assert_eq!(
            err.to_string(),
            "Out of memory: could not allocate 64 bytes for mask slicing"
        );

        let err = Error::IndexOutOfBounds { index: 7, dim: 3 };
        assert_eq!(err.to_string(), "Index 7 out of bounds for dimension 3");

        let err = Error::DuplicateIndex { index: 2 };
        assert_eq!(err.to_string(), "Duplicate index 2 in index list");

        let err = Error::InvalidParameter("row assign needs one row".to_string());
        assert_eq!(err.to_string(), "Invalid parameter: row assign needs one row");
    }

    #[test]
    fn test_error_helper_functions() {
        let err = Error::out_of_memory::<u64>(4, "task slices");
        match err {
            Error::OutOfMemory { bytes, context } => {
                assert_eq!(bytes, 32);
                assert_eq!(context, "task slices");
            }
            _ => panic!("Wrong error type"),
        }

        let err = Error::shape_mismatch((3, 3), (2, 3), "mask");
        assert_eq!(
            err.to_string(),
            "Dimension mismatch in mask: expected 3x3, got 2x3"
        );

        let err = Error::size_mismatch(4, 5, "row index list");
        assert_eq!(
            err.to_string(),
            "Dimension mismatch in row index list: expected 4, got 5"
        );
    }

    #[test]
    fn test_out_of_memory_saturates() {
        let err = Error::out_of_memory::<u64>(usize::MAX, "huge");
        assert!(err.is_out_of_memory());
        match err {
            Error::OutOfMemory { bytes, .. } => assert_eq!(bytes, usize::MAX),
            _ => panic!("Wrong error type"),
        }
    }

    #[test]
    fn test_error_from_anyhow() {
        let anyhow_err = anyhow::anyhow!("custom error message");
        let err: Error = anyhow_err.into();

        match err {
            Error::Other(_) => {
                assert!(err.to_string().contains("custom error message"));
                assert!(!err.is_out_of_memory());
            }
            _ => panic!("Wrong error type"),
        }
    }
}
