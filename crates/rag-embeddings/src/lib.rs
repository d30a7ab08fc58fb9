//! # rag-embeddings
//!
//! Local dense embedding generation using fastembed (ONNX runtime).
//!
//! Produces 384-dimensional, unit-normalized vectors in cosine-similarity
//! space for document text and search queries, with no external API calls.
//! The underlying fastembed API is synchronous CPU-bound work; callers on
//! an async runtime should run [`DenseEmbedder::embed_batch`] inside
//! `tokio::task::spawn_blocking`.

pub mod error;

use std::path::PathBuf;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

pub use error::EmbeddingError;

/// Output dimensionality of the default model.
pub const DEFAULT_DIMENSION: usize = 384;

/// Wraps a loaded fastembed model and exposes batched, unit-normalized
/// embedding generation.
pub struct DenseEmbedder {
    model: TextEmbedding,
    batch_size: usize,
}

impl DenseEmbedder {
    /// Loads `model_id` (e.g. `"AllMiniLML6V2"`, `"BGESmallENV15"`) with its
    /// cache rooted at `cache_dir`. Unrecognized model ids fall back to the
    /// default `AllMiniLML6V2`.
    pub fn new(model_id: &str, cache_dir: PathBuf, batch_size: usize) -> Result<Self, EmbeddingError> {
        let model_variant = resolve_model(model_id);
        let options = InitOptions::new(model_variant).with_cache_dir(cache_dir);
        let model = TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::InitFailed(e.to_string()))?;
        tracing::info!(model_id, "dense embedding model loaded");
        Ok(Self {
            model,
            batch_size: batch_size.max(1),
        })
    }

    /// Embeds `texts` in batches of `batch_size`, returning one
    /// unit-normalized vector per input in the same order.
    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let embeddings = self
            .model
            .embed(refs, Some(self.batch_size))
            .map_err(|e| EmbeddingError::EmbedFailed(e.to_string()))?;
        if embeddings.is_empty() {
            return Err(EmbeddingError::EmptyResult);
        }
        Ok(embeddings.into_iter().map(|v| normalize(&v)).collect())
    }

    /// Embeds a single query string.
    pub fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut result = self.embed_batch(std::slice::from_ref(&text.to_string()))?;
        result.pop().ok_or(EmbeddingError::EmptyResult)
    }
}

fn resolve_model(model_id: &str) -> EmbeddingModel {
    match model_id {
        "BGESmallENV15" => EmbeddingModel::BGESmallENV15,
        "AllMiniLML6V2" => EmbeddingModel::AllMiniLML6V2,
        other => {
            tracing::warn!(model_id = other, "unrecognized embedding model id, defaulting to AllMiniLML6V2");
            EmbeddingModel::AllMiniLML6V2
        }
    }
}

/// Scales `vector` to unit L2 norm. A zero vector is returned unchanged.
#[must_use]
pub fn normalize(vector: &[f32]) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        return vector.to_vec();
    }
    vector.iter().map(|x| x / norm).collect()
}

/// Cosine similarity between two equal-length vectors. Returns 0.0 if
/// either vector has zero norm.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_produces_unit_length_vector() {
        let v = normalize(&[3.0, 4.0]);
        let norm = (v[0] * v[0] + v[1] * v[1]).sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_zero_vector_unchanged() {
        assert_eq!(normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn cosine_similarity_of_identical_vectors_is_one() {
        let v = normalize(&[1.0, 2.0, 3.0]);
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cosine_similarity_of_orthogonal_vectors_is_zero() {
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-6);
    }

    #[test]
    fn unrecognized_model_id_resolves_to_default() {
        assert!(matches!(resolve_model("nonsense"), EmbeddingModel::AllMiniLML6V2));
    }
}
