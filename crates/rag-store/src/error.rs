//! Errors from the document store.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagStoreError {
    /// Failed to read or write the document file or a backup copy.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document file exists but is not valid JSON, or does not match
    /// the expected shape.
    #[error("failed to parse document file: {0}")]
    Serialization(#[from] serde_json::Error),
}
