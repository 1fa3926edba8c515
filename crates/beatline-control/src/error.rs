//! Error types for input mapping
use thiserror::Error;

/// Control errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Key name that does not map to any [`crate::Key`]
    #[error("Unknown key: {0}")]
    UnknownKey(String),
}

/// Result type for control operations
pub type Result<T> = std::result::Result<T, ControlError>;
