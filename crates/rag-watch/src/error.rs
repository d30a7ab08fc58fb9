//! Errors from the file watcher and stream hub.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("watch I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file watcher error: {0}")]
    Notify(#[from] notify::Error),

    #[error("failed to read document file: {0}")]
    Store(#[from] rag_store::RagStoreError),
}
