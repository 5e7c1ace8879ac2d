//! Error types for the Flock clustering engine.

use thiserror::Error;

/// The main error type for clustering operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlockError {
    /// Invalid configuration, such as a zero cluster count or more clusters
    /// than points.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Mismatched input shapes.
    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Which input had the wrong shape.
        what: String,
        /// The expected length.
        expected: usize,
        /// The length that was supplied.
        found: usize,
    },

    /// Empty input.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// A working buffer could not be allocated.
    #[error("Allocation failed: {0}")]
    Allocation(String),

    /// The call was cancelled through its [`CancelToken`](crate::CancelToken).
    #[error("Operation cancelled")]
    Cancelled,
}

/// Result type alias for clustering operations.
pub type Result<T> = std::result::Result<T, FlockError>;

impl From<std::collections::TryReserveError> for FlockError {
    fn from(err: std::collections::TryReserveError) -> Self {
        FlockError::Allocation(err.to_string())
    }
}
