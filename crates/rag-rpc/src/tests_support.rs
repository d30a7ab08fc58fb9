//! Test-only helpers shared across this crate's `#[cfg(test)]` modules.

#![cfg(test)]

use std::sync::Arc;

use rag_search::{CascadeThresholds, DerivedIndices};
use rag_store::{DocumentStore, StoreOptions};

use crate::engine::{EngineConfig, RagEngine};

pub async fn empty_engine() -> Arc<RagEngine> {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = StoreOptions {
        cache_dir: dir.path().to_path_buf(),
        dedup_enabled: true,
        versioning_enabled: true,
        auto_migrate_ids: true,
        auto_save: false,
        backup_retention: 2,
    };
    let store = DocumentStore::empty(options);
    let indices = DerivedIndices::build(&[], None, false, false, 1000).expect("build indices");
    let config = EngineConfig {
        cache_dir: dir.keep(),
        thresholds: CascadeThresholds { dense: 0.1, sparse: 0.05 },
        default_limit: 5,
    };
    Arc::new(RagEngine::new(store, indices, None, config))
}
