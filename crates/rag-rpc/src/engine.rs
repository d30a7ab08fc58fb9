//! Shared engine state behind the tool dispatcher. Owns the document
//! store and derived indices, keeps them row-aligned under a single
//! lock, and persists after every mutation — grounded on
//! `rag_server_v2.py`'s `RAGServer`, which holds the same three pieces
//! (documents, embeddings, TF-IDF) behind one object and re-saves after
//! `add_document`/`remove_document`.

use std::path::PathBuf;
use std::sync::Arc;

use rag_core::{Document, DocumentPatch, DocumentType};
use rag_embeddings::DenseEmbedder;
use rag_search::attributes::AttributeIndices;
use rag_search::{CascadeThresholds, DerivedIndices, ScoredDocument};
use rag_store::{DocumentStore, ListFilter, StoreStats};
use tokio::sync::RwLock;

use crate::error::DispatchError;

/// The runtime knobs the engine needs that originate from `rag-config`,
/// copied in rather than taking a dependency on that crate.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub cache_dir: PathBuf,
    pub thresholds: CascadeThresholds,
    pub default_limit: usize,
}

struct EngineState {
    store: DocumentStore,
    indices: DerivedIndices,
}

/// `stats` result: the store's own counters plus the facts only the
/// engine knows — whether each matrix tier is actually loaded, and the
/// running server's version, mirroring `rag_server_v2.py`'s
/// `has_embeddings`/`has_tfidf`/`server_version` fields.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EngineStats {
    #[serde(flatten)]
    pub store: StoreStats,
    pub has_dense_index: bool,
    pub has_sparse_index: bool,
    pub server_version: &'static str,
}

/// The single entry point every tool call mutates or reads through. One
/// `tokio::sync::RwLock` spans the full mutate → persist → reindex
/// sequence for writers, and guards a consistent snapshot for readers.
pub struct RagEngine {
    state: RwLock<EngineState>,
    embedder: Option<DenseEmbedder>,
    config: EngineConfig,
}

impl RagEngine {
    #[must_use]
    pub fn new(store: DocumentStore, indices: DerivedIndices, embedder: Option<DenseEmbedder>, config: EngineConfig) -> Self {
        Self {
            state: RwLock::new(EngineState { store, indices }),
            embedder,
            config,
        }
    }

    #[must_use]
    pub fn default_limit(&self) -> usize {
        self.config.default_limit
    }

    pub async fn search(&self, query: &str, limit: usize, use_semantic: bool) -> Vec<ScoredDocument> {
        let state = self.state.read().await;
        let embedder = if use_semantic { self.embedder.as_ref() } else { None };
        rag_search::search(state.store.documents(), &state.indices, embedder, query, limit, self.config.thresholds)
    }

    pub async fn search_by_tags(&self, tags: &[String], limit: usize) -> Vec<Document> {
        let state = self.state.read().await;
        rag_search::search_by_tags(state.store.documents(), &state.indices, tags, limit)
    }

    pub async fn search_by_category(&self, category: &str, limit: usize) -> Vec<Document> {
        let state = self.state.read().await;
        rag_search::search_by_category(state.store.documents(), &state.indices, category, limit)
    }

    pub async fn list(&self, filter: ListFilter) -> Vec<rag_core::DocumentSummary> {
        let state = self.state.read().await;
        state.store.list(&filter)
    }

    pub async fn stats(&self) -> EngineStats {
        let state = self.state.read().await;
        EngineStats {
            store: state.store.stats(),
            has_dense_index: state.indices.dense.is_some(),
            has_sparse_index: state.indices.sparse.is_some(),
            server_version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Adds a document, appending its row to every enabled index on the
    /// non-dedup path, or refreshing only the attribute index (tags may
    /// have changed) on the dedup path where content — and therefore the
    /// embedding and TF-IDF rows — is unchanged.
    pub async fn add(
        &self,
        title: String,
        content: String,
        doc_type: DocumentType,
        source: Option<String>,
        category: Option<String>,
        tags: std::collections::BTreeSet<String>,
    ) -> Result<(Document, bool), DispatchError> {
        let mut state = self.state.write().await;
        let (doc, deduped) = state.store.add(title, content, doc_type, source, category, tags)?;

        if !deduped {
            if let Some(dense) = state.indices.dense.as_mut() {
                if let Some(embedder) = &self.embedder {
                    dense.insert_row(&doc, embedder)?;
                }
            }
            if let Some(sparse) = state.indices.sparse.as_mut() {
                sparse.insert_row(&doc.content);
            }
        }
        state.indices.attributes = AttributeIndices::build(state.store.documents());
        state.indices.persist(&self.config.cache_dir)?;
        Ok((doc, deduped))
    }

    /// Applies `patch`, re-embedding and re-vectorizing the row in place
    /// when title/content changed. Returns `false` if `id` does not
    /// resolve.
    pub async fn update(&self, id: &str, patch: DocumentPatch) -> Result<bool, DispatchError> {
        let mut state = self.state.write().await;
        let Some(row) = state.store.position_of(id) else {
            return Ok(false);
        };
        let changes_content = patch.changes_content();
        let ok = state.store.update(id, patch)?;
        if ok && changes_content {
            let doc = state.store.documents()[row].clone();
            if let Some(dense) = state.indices.dense.as_mut() {
                if let Some(embedder) = &self.embedder {
                    dense.replace_row(row, &doc, embedder)?;
                }
            }
            if let Some(sparse) = state.indices.sparse.as_mut() {
                sparse.replace_row(row, &doc.content);
            }
        }
        if ok {
            state.indices.attributes = AttributeIndices::build(state.store.documents());
            state.indices.persist(&self.config.cache_dir)?;
        }
        Ok(ok)
    }

    /// Removes the document, dropping its row contiguously from every
    /// matrix index. Returns `false` if `id` does not resolve.
    pub async fn remove(&self, id: &str) -> Result<bool, DispatchError> {
        let mut state = self.state.write().await;
        let Some(row) = state.store.position_of(id) else {
            return Ok(false);
        };
        let ok = state.store.remove(id)?;
        if ok {
            if let Some(dense) = state.indices.dense.as_mut() {
                dense.remove_row(row);
            }
            if let Some(sparse) = state.indices.sparse.as_mut() {
                sparse.remove_row(row);
            }
            state.indices.attributes = AttributeIndices::build(state.store.documents());
            state.indices.persist(&self.config.cache_dir)?;
        }
        Ok(ok)
    }
}

pub type SharedEngine = Arc<RagEngine>;
