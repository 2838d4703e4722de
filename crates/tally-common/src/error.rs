//! Error types for Tally.

use thiserror::Error;

/// Top-level error type for Tally operations.
#[derive(Debug, Error)]
pub enum TallyError {
    /// Tag tree errors
    #[error("Tag error: {0}")]
    Tag(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Expected version
        expected: String,
        /// Actual version found
        actual: String,
    },
}

/// Result type alias for Tally operations.
pub type TallyResult<T> = Result<T, TallyError>;
