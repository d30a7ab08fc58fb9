//! Dense tier: an in-memory, unit-normalized embedding matrix with a
//! brute-force cosine scan. No approximate-nearest-neighbor structure —
//! the corpus is expected to stay in the O(10⁴) range.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use rag_core::Document;
use rag_embeddings::{cosine_similarity, DenseEmbedder};

use crate::error::SearchError;
use crate::npy;

#[derive(Debug, Clone, Default)]
pub struct DenseIndex {
    matrix: Vec<Vec<f32>>,
}

impl DenseIndex {
    /// Encodes `title ⧺ content` for every document, in batches, via
    /// `embedder`. Row `i` corresponds to `documents[i]`.
    pub fn build(documents: &[Document], embedder: &DenseEmbedder) -> Result<Self, SearchError> {
        let texts: Vec<String> = documents
            .iter()
            .map(|d| format!("{} {}", d.title, d.content))
            .collect();
        let matrix = embedder.embed_batch(&texts)?;
        Ok(Self { matrix })
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.matrix.len()
    }

    /// Embeds `row` for a document that changed content, replacing the
    /// existing row in place (used by `update`).
    pub fn replace_row(&mut self, row: usize, document: &Document, embedder: &DenseEmbedder) -> Result<(), SearchError> {
        let text = format!("{} {}", document.title, document.content);
        let vector = embedder.embed_one(&text)?;
        if row < self.matrix.len() {
            self.matrix[row] = vector;
        }
        Ok(())
    }

    pub fn insert_row(&mut self, document: &Document, embedder: &DenseEmbedder) -> Result<(), SearchError> {
        let text = format!("{} {}", document.title, document.content);
        self.matrix.push(embedder.embed_one(&text)?);
        Ok(())
    }

    pub fn remove_row(&mut self, row: usize) {
        if row < self.matrix.len() {
            self.matrix.remove(row);
        }
    }

    /// Top-`limit` rows scoring strictly above `threshold`, ordered by
    /// descending score with ascending-row-index as the tie-break.
    #[must_use]
    pub fn search(&self, query_vector: &[f32], limit: usize, threshold: f32) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .matrix
            .iter()
            .enumerate()
            .map(|(row, vector)| (row, cosine_similarity(vector, query_vector)))
            .filter(|(_, score)| *score > threshold)
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));
        scored.truncate(limit);
        scored
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let file = File::create(path)?;
        npy::write_f32_matrix(BufWriter::new(file), &self.matrix)
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let matrix = npy::read_f32_matrix(file)?;
        Ok(Self { matrix })
    }
}
