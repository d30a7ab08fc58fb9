//! # rag-core
//!
//! Core types shared across every crate of the retrieval engine: the
//! [`Document`] record, canonical/legacy identity resolution, content
//! hashing, and the cross-cutting [`RagCoreError`] type.

pub mod document;
pub mod errors;
pub mod ids;

pub use document::{Document, DocumentPatch, DocumentSummary, DocumentType};
pub use errors::RagCoreError;
pub use ids::{is_canonical_id, new_canonical_id};
