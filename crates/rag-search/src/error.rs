//! Errors from derived-index construction and ranked retrieval.

/// Errors from building or querying the dense/sparse/attribute indices.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Error from the dense embedding backend.
    #[error("embedding error: {0}")]
    Embedding(#[from] rag_embeddings::EmbeddingError),

    /// Invalid or empty search query.
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}
