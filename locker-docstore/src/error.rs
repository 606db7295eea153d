//! Error types for document storage.

use thiserror::Error;

/// Result type for document store operations.
pub type DocStoreResult<T> = Result<T, DocStoreError>;

/// Document store errors.
#[derive(Debug, Error)]
pub enum DocStoreError {
    /// No blob under this key.
    #[error("document not found: {username}/{name}")]
    NotFound { username: String, name: String },

    /// Username or document name is not a safe single segment.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// The underlying storage failed.
    #[error("storage error: {0}")]
    Storage(String),
}
