//! Storage errors

use thiserror::Error;

/// Storage backend errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database failed to open
    #[error("Database open failed: {0}")]
    OpenFailed(String),

    /// Write operation failed
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Read operation failed
    #[error("Read failed: {0}")]
    ReadFailed(String),

    /// Delete operation failed
    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    /// Tree operation failed
    #[error("Tree operation failed: {0}")]
    TreeFailed(String),

    /// Conditional update lost to a concurrent writer
    #[error("Compare-and-swap conflict: record was modified")]
    CasConflict,

    /// Record does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Record could not be encoded or decoded
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Transport failure talking to the hosted database
    #[error("Remote request failed: {0}")]
    Http(String),

    /// Hosted database answered with an error status
    #[error("Remote store returned {status}: {body}")]
    Remote { status: u16, body: String },

    /// Record failed validation
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Backend configuration is unusable
    #[error("Invalid storage configuration: {0}")]
    Config(String),

    /// Task execution failed
    #[error("Task execution failed: {0}")]
    TaskFailed(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(e: reqwest::Error) -> Self {
        StorageError::Http(e.to_string())
    }
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
