//! Retrieval engine binary. Wires configuration, the document store,
//! embeddings, derived indices, the RPC dispatcher, the file watcher, and
//! the stream hub together, then runs the RPC server to completion.
//!
//! Grounded on `zen-cli/src/main.rs`'s `init_tracing` + async-main shape,
//! scaled down to this binary's single long-running task set.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use rag_config::RagConfig;
use rag_rpc::{Dispatcher, EngineConfig, RagEngine};
use rag_search::{CascadeThresholds, DerivedIndices};
use rag_store::{DocumentStore, StoreOptions};
use tracing_subscriber::EnvFilter;

const CONFIG_FILE: &str = "rag-engine.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RagConfig::load(CONFIG_FILE).context("failed to load configuration")?;
    init_tracing(&config.logging.level);

    tracing::info!(cache_dir = %config.store.cache_dir, "starting rag-engine");

    let cache_dir = PathBuf::from(&config.store.cache_dir);
    std::fs::create_dir_all(&cache_dir).context("failed to create cache directory")?;

    let store_options = StoreOptions {
        cache_dir: cache_dir.clone(),
        dedup_enabled: config.store.dedup_enabled,
        versioning_enabled: config.store.versioning_enabled,
        auto_migrate_ids: config.store.auto_migrate_ids,
        auto_save: config.store.auto_save,
        backup_retention: config.store.backup_retention,
    };
    let store = DocumentStore::load(store_options).context("failed to load document store")?;

    let embedder = if config.embedding.enabled {
        match rag_embeddings::DenseEmbedder::new(&config.embedding.model_id, cache_dir.clone(), config.embedding.batch_size) {
            Ok(embedder) => Some(embedder),
            Err(error) => {
                tracing::warn!(%error, "embedding model failed to load, dense tier disabled");
                None
            }
        }
    } else {
        None
    };

    let indices = DerivedIndices::load_or_rebuild(
        &cache_dir,
        store.documents(),
        embedder.as_ref(),
        config.embedding.enabled && embedder.is_some(),
        config.search.sparse_enabled,
        config.search.max_features,
    )
    .context("failed to build derived indices")?;
    indices.persist(&cache_dir).context("failed to persist derived indices")?;

    let documents_path = cache_dir.join("documents.json");

    let engine_config = EngineConfig {
        cache_dir: cache_dir.clone(),
        thresholds: CascadeThresholds {
            dense: config.search.similarity_threshold,
            sparse: config.search.sparse_threshold,
        },
        default_limit: config.search.default_limit,
    };
    let engine = Arc::new(RagEngine::new(store, indices, embedder, engine_config));
    let dispatcher = Dispatcher::new(engine);

    let watcher = rag_watch::spawn(
        documents_path,
        rag_watch::ProjectionPredicate::a2a_default(),
        None,
        config.store.auto_migrate_ids,
    )
    .context("failed to start document-file watcher")?;

    let hub = rag_watch::StreamHub::new(watcher.receiver.clone());
    let bind_addr = config.stream.bind_addr.clone();
    tokio::spawn(async move {
        match tokio::net::TcpListener::bind(&bind_addr).await {
            Ok(listener) => {
                tracing::info!(%bind_addr, "stream hub listening");
                if let Err(error) = axum::serve(listener, hub.router()).await {
                    tracing::error!(%error, "stream hub server exited");
                }
            }
            Err(error) => {
                tracing::error!(%error, %bind_addr, "stream hub failed to bind");
            }
        }
    });

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    rag_rpc::server::run(stdin, stdout, dispatcher).await.context("RPC server terminated with an I/O error")?;

    // `watcher` must outlive the RPC loop so the OS-level file watch stays
    // registered; drop it explicitly once the server has shut down.
    drop(watcher);
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
