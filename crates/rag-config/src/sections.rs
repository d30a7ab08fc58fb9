//! Nested configuration sections making up [`crate::RagConfig`].
//!
//! Each section mirrors one row of SPEC_FULL.md §6's configuration table.
//! Field names match the `RAG__<SECTION>__<FIELD>` environment layout
//! (`__` nesting, see [`crate::RagConfig::load`]).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Where all persisted state (`documents.json`, matrices, backups) lives.
    pub cache_dir: String,
    /// Persist after every mutation.
    #[serde(default = "default_true")]
    pub auto_save: bool,
    /// Toggle dedup-by-content-hash on `add`.
    #[serde(default = "default_true")]
    pub dedup_enabled: bool,
    /// Toggle `version` increments on the dedup path.
    #[serde(default = "default_true")]
    pub versioning_enabled: bool,
    /// Toggle legacy-id migration on load.
    #[serde(default = "default_true")]
    pub auto_migrate_ids: bool,
    /// How many rotating `documents.json.bak.<timestamp>` copies to retain.
    #[serde(default = "default_backup_retention")]
    pub backup_retention: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            auto_save: true,
            dedup_enabled: true,
            versioning_enabled: true,
            auto_migrate_ids: true,
            backup_retention: default_backup_retention(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Which embedding model to load, e.g. `"AllMiniLML6V2"`.
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Disable the dense tier entirely.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Encoder batch size.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            enabled: true,
            batch_size: default_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Disable the sparse (TF-IDF) tier.
    #[serde(default = "default_true")]
    pub sparse_enabled: bool,
    /// Sparse vocabulary cap.
    #[serde(default = "default_max_features")]
    pub max_features: usize,
    /// Dense-tier minimum cosine similarity.
    #[serde(default = "default_dense_threshold")]
    pub similarity_threshold: f32,
    /// Sparse-tier minimum cosine similarity.
    #[serde(default = "default_sparse_threshold")]
    pub sparse_threshold: f32,
    /// Default `limit` when a caller omits it.
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            sparse_enabled: true,
            max_features: default_max_features(),
            similarity_threshold: default_dense_threshold(),
            sparse_threshold: default_sparse_threshold(),
            default_limit: default_search_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `"info"`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to also emit logs to stderr (always true for the RPC server,
    /// since stdout is reserved for JSON-RPC frames).
    #[serde(default = "default_true")]
    pub log_to_stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_to_stderr: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamConfig {
    /// Host/port the stream hub's websocket listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

const fn default_true() -> bool {
    true
}

fn default_cache_dir() -> String {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("rag-engine")
        .to_string_lossy()
        .into_owned()
}

fn default_model_id() -> String {
    "AllMiniLML6V2".to_string()
}

const fn default_batch_size() -> usize {
    32
}

const fn default_max_features() -> usize {
    1000
}

const fn default_dense_threshold() -> f32 {
    0.1
}

const fn default_sparse_threshold() -> f32 {
    0.05
}

const fn default_search_limit() -> usize {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_backup_retention() -> u32 {
    10
}

fn default_bind_addr() -> String {
    "127.0.0.1:8799".to_string()
}
