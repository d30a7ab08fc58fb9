//! Cross-cutting error type for `rag-core`.
//!
//! Domain-specific errors (store I/O, search ranking, RPC transport) are
//! defined in their own crates; this type covers only failures that can
//! originate from document/identity logic itself.

use thiserror::Error;

/// Errors raised while constructing or validating a [`crate::Document`].
#[derive(Debug, Error)]
pub enum RagCoreError {
    /// A required field (`title` or `content`) was empty.
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced document id does not resolve to any known document.
    #[error("document not found: {0}")]
    NotFound(String),
}
