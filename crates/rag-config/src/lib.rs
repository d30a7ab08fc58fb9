//! # rag-config
//!
//! Layered configuration loading for the retrieval engine, using figment.
//!
//! Configuration sources, in increasing precedence:
//! 1. Compiled-in defaults ([`sections`]).
//! 2. An optional TOML file.
//! 3. Environment variables under the `RAG__` prefix, `__`-nested
//!    (`RAG__SEARCH__SIMILARITY_THRESHOLD` → `search.similarity_threshold`).
//!
//! A `.env` file in the working directory is loaded via `dotenvy` before
//! the environment provider runs, so its entries participate as ordinary
//! environment variables.

pub mod error;
pub mod sections;

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

pub use error::ConfigError;
pub use sections::{EmbeddingConfig, LoggingConfig, SearchConfig, StoreConfig, StreamConfig};

const ENV_PREFIX: &str = "RAG__";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RagConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub stream: StreamConfig,
}

impl RagConfig {
    /// Loads configuration from defaults, an optional TOML file at
    /// `toml_path` (ignored if absent), and `RAG__`-prefixed environment
    /// variables, in that precedence order. Loads `.env` first via
    /// `dotenvy` (best-effort; a missing `.env` is not an error).
    pub fn load(toml_path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let figment = Figment::from(Serialized::defaults(RagConfig::default()))
            .merge(Toml::file(toml_path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        figment.extract().map_err(ConfigError::Figment)
    }

    /// Loads configuration the same way as [`RagConfig::load`] but without
    /// touching a TOML file — defaults plus environment only. Used by the
    /// binary when no config file is supplied, and by tests that want to
    /// control the environment precisely.
    pub fn load_env_only() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let figment = Figment::from(Serialized::defaults(RagConfig::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        figment.extract().map_err(ConfigError::Figment)
    }
}
