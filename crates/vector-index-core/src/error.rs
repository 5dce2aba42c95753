//! Error types for vector index construction and search.
//!
//! Every public operation surfaces a tagged failure rather than panicking or
//! throwing; there is no recovery or retry logic inside the core — callers
//! decide what to do with a returned [`Error`].

use thiserror::Error;

/// Result type alias used throughout `vector-index-core`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or querying an index.
#[derive(Error, Debug)]
pub enum Error {
    /// A build or search parameter was out of its valid range.
    ///
    /// Covers `k = 0`, `M = 0`, `efConstruction = 0`, and similar
    /// zero/negative parameters that make the requested operation
    /// meaningless.
    #[error("invalid parameter `{name}`: {message}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Human-readable description of why the value is invalid.
        message: String,
    },

    /// Construction was attempted with zero vectors.
    #[error("empty input: index requires at least one vector")]
    EmptyInput,

    /// A vector collaborator (dataset file reader) failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A query (or an input vector during build) did not match the index's
    /// fixed dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension fixed at index construction time.
        expected: usize,
        /// Dimension actually observed.
        actual: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_display() {
        // Arrange
        let err = Error::InvalidParameter {
            name: "m",
            message: "must be >= 1".to_string(),
        };

        // Act
        let display = format!("{err}");

        // Assert
        assert!(display.contains('m'));
        assert!(display.contains("must be >= 1"));
    }

    #[test]
    fn test_dimension_mismatch_display() {
        // Arrange
        let err = Error::DimensionMismatch {
            expected: 32,
            actual: 16,
        };

        // Act
        let display = format!("{err}");

        // Assert
        assert!(display.contains("32"));
        assert!(display.contains("16"));
    }

    #[test]
    fn test_from_io_error() {
        // Arrange
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");

        // Act
        let err: Error = io_err.into();

        // Assert
        assert!(matches!(err, Error::IoError(_)));
        assert!(format!("{err}").contains("file not found"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
