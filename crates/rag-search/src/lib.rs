//! # rag-search
//!
//! The derived indices (C2) and the cascading retrieval engine (C3):
//! dense embedding matrix, sparse TF-IDF matrix, tag/category inverted
//! indices, and a dense → sparse → substring ranking cascade.

pub mod attributes;
pub mod dense;
pub mod engine;
pub mod error;
pub mod indices;
pub mod npy;
pub mod sparse;

pub use engine::{search, search_by_tags, search_by_category, CascadeThresholds, ScoredDocument, SearchTier};
pub use error::SearchError;
pub use indices::DerivedIndices;
