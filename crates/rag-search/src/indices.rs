//! C2: the derived indices bundle — dense matrix, sparse matrix, and
//! attribute indices — kept row-aligned with the document store.

use std::path::Path;

use rag_core::Document;
use rag_embeddings::DenseEmbedder;

use crate::attributes::AttributeIndices;
use crate::dense::DenseIndex;
use crate::error::SearchError;
use crate::sparse::SparseIndex;

const VECTORS_FILE: &str = "vectors.npy";
const SPARSE_FILE: &str = "sparse_index.json";

pub struct DerivedIndices {
    pub dense: Option<DenseIndex>,
    pub sparse: Option<SparseIndex>,
    pub attributes: AttributeIndices,
}

impl DerivedIndices {
    /// Builds every enabled index fresh from `documents`.
    pub fn build(
        documents: &[Document],
        embedder: Option<&DenseEmbedder>,
        dense_enabled: bool,
        sparse_enabled: bool,
        max_features: usize,
    ) -> Result<Self, SearchError> {
        let dense = match (dense_enabled, embedder) {
            (true, Some(embedder)) => Some(DenseIndex::build(documents, embedder)?),
            _ => None,
        };
        let sparse = if sparse_enabled {
            let contents: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
            Some(SparseIndex::build(&contents, max_features))
        } else {
            None
        };
        Ok(Self {
            dense,
            sparse,
            attributes: AttributeIndices::build(documents),
        })
    }

    /// Loads persisted dense/sparse state from `cache_dir`, rebuilding
    /// whichever index is absent, stale, or row-count-mismatched against
    /// `documents`.
    pub fn load_or_rebuild(
        cache_dir: &Path,
        documents: &[Document],
        embedder: Option<&DenseEmbedder>,
        dense_enabled: bool,
        sparse_enabled: bool,
        max_features: usize,
    ) -> Result<Self, SearchError> {
        let dense = if dense_enabled {
            let loaded = DenseIndex::load(&cache_dir.join(VECTORS_FILE))
                .ok()
                .filter(|idx| idx.row_count() == documents.len());
            match loaded {
                Some(idx) => Some(idx),
                None => match embedder {
                    Some(embedder) => Some(DenseIndex::build(documents, embedder)?),
                    None => None,
                },
            }
        } else {
            None
        };

        let sparse = if sparse_enabled {
            let loaded = SparseIndex::load(&cache_dir.join(SPARSE_FILE))
                .ok()
                .filter(|idx| idx.row_count() == documents.len());
            match loaded {
                Some(idx) => Some(idx),
                None => {
                    let contents: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
                    Some(SparseIndex::build(&contents, max_features))
                }
            }
        } else {
            None
        };

        Ok(Self {
            dense,
            sparse,
            attributes: AttributeIndices::build(documents),
        })
    }

    pub fn persist(&self, cache_dir: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(cache_dir)?;
        if let Some(dense) = &self.dense {
            dense.save(&cache_dir.join(VECTORS_FILE))?;
        }
        if let Some(sparse) = &self.sparse {
            sparse.save(&cache_dir.join(SPARSE_FILE))?;
        }
        Ok(())
    }

    /// Rebuilds every index from scratch against the current `documents`.
    /// Called after any mutation that the caller does not want to
    /// incrementally patch (simplest correct option; row alignment is
    /// always restored).
    pub fn rebuild(
        &mut self,
        documents: &[Document],
        embedder: Option<&DenseEmbedder>,
        dense_enabled: bool,
        sparse_enabled: bool,
        max_features: usize,
    ) -> Result<(), SearchError> {
        *self = Self::build(documents, embedder, dense_enabled, sparse_enabled, max_features)?;
        Ok(())
    }
}
