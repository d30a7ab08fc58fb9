//! # rag-store
//!
//! The document store (C1): canonical identity, content-hash
//! deduplication, versioning, migration-on-load, and atomic persistence
//! with rotating backups.

pub mod document_file;
pub mod error;
pub mod store;

pub use error::RagStoreError;
pub use store::{DocumentStore, ListFilter, StoreOptions, StoreStats};
