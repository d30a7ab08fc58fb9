//! Hand-rolled TF-IDF sparse vectorizer.
//!
//! No crate in the example pack provides this (the closest teacher
//! analogue, `zen-search`'s `fts.rs`, wraps a database's own FTS5 engine),
//! so it is implemented first-party: tokenize, build a document-frequency
//! capped vocabulary, weight by smoothed IDF, and L2-normalize each row —
//! the same shape as `sklearn.feature_extraction.text.TfidfVectorizer`
//! that the original Python implementation used.

use std::collections::HashMap;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "that", "the", "to", "was", "were", "will", "with", "this", "but", "they",
    "have", "had", "what", "when", "where", "who", "which", "why", "how", "or", "not", "can",
    "could", "would", "should", "i", "you", "we", "your", "their", "our", "his", "her", "them",
    "these", "those", "am", "been", "being", "do", "does", "did", "doing", "if", "about", "into",
    "through", "during", "before", "after", "above", "below", "up", "down", "out", "off", "over",
    "under", "again", "then", "once", "here", "there", "all", "each", "few", "more", "most",
    "other", "some", "such", "no", "nor", "only", "own", "same", "so", "than", "too", "very", "just",
];

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 2 && !STOPWORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// A fitted TF-IDF vectorizer: vocabulary plus per-term IDF weights.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TfidfVectorizer {
    /// Term → column index, stable for the lifetime of the fit.
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    max_features: usize,
}

impl TfidfVectorizer {
    /// Fits vocabulary and IDF weights from `documents`, capping the
    /// vocabulary at `max_features` terms (highest corpus frequency
    /// first), matching `TfidfVectorizer(max_features=...)`.
    #[must_use]
    pub fn fit(documents: &[String], max_features: usize) -> Self {
        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        let mut corpus_frequency: HashMap<String, usize> = HashMap::new();
        let n_docs = documents.len();

        for doc in documents {
            let tokens = tokenize(doc);
            let mut seen = std::collections::HashSet::new();
            for term in &tokens {
                *corpus_frequency.entry(term.clone()).or_insert(0) += 1;
                if seen.insert(term.clone()) {
                    *document_frequency.entry(term.clone()).or_insert(0) += 1;
                }
            }
        }

        let mut terms: Vec<&String> = corpus_frequency.keys().collect();
        terms.sort_by(|a, b| {
            corpus_frequency[*b]
                .cmp(&corpus_frequency[*a])
                .then_with(|| a.as_str().cmp(b.as_str()))
        });
        terms.truncate(max_features);
        terms.sort();

        let mut vocabulary = HashMap::new();
        let mut idf = vec![0.0; terms.len()];
        for (idx, term) in terms.iter().enumerate() {
            vocabulary.insert((*term).clone(), idx);
            let df = document_frequency.get(*term).copied().unwrap_or(0);
            // Smoothed IDF, as sklearn's default `smooth_idf=True`.
            idf[idx] = ((1.0 + n_docs as f32) / (1.0 + df as f32)).ln() + 1.0;
        }

        Self {
            vocabulary,
            idf,
            max_features,
        }
    }

    #[must_use]
    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    #[must_use]
    pub fn max_features(&self) -> usize {
        self.max_features
    }

    /// Transforms `text` into an L2-normalized, dense row aligned to the
    /// fitted vocabulary. Terms absent from the vocabulary are ignored.
    #[must_use]
    pub fn transform(&self, text: &str) -> Vec<f32> {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for term in tokenize(text) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }
        let mut row = vec![0.0; self.vocabulary.len()];
        for (idx, count) in counts {
            row[idx] = count * self.idf[idx];
        }
        l2_normalize(&mut row);
        row
    }

    /// Transforms every document, producing a row-aligned matrix.
    #[must_use]
    pub fn transform_all(&self, documents: &[String]) -> Vec<Vec<f32>> {
        documents.iter().map(|d| self.transform(d)).collect()
    }
}

fn l2_normalize(row: &mut [f32]) {
    let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in row.iter_mut() {
            *v /= norm;
        }
    }
}

/// Cosine similarity between two already-L2-normalized rows of equal
/// length is just their dot product.
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// A fitted vectorizer plus the row-aligned matrix it produced for the
/// current corpus. Rebuilt wholesale on corpus-size mismatch, same as the
/// dense tier.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SparseIndex {
    vectorizer: TfidfVectorizer,
    matrix: Vec<Vec<f32>>,
}

impl SparseIndex {
    #[must_use]
    pub fn build(documents: &[String], max_features: usize) -> Self {
        let vectorizer = TfidfVectorizer::fit(documents, max_features);
        let matrix = vectorizer.transform_all(documents);
        Self { vectorizer, matrix }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.matrix.len()
    }

    pub fn replace_row(&mut self, row: usize, content: &str) {
        if row < self.matrix.len() {
            self.matrix[row] = self.vectorizer.transform(content);
        }
    }

    pub fn insert_row(&mut self, content: &str) {
        self.matrix.push(self.vectorizer.transform(content));
    }

    pub fn remove_row(&mut self, row: usize) {
        if row < self.matrix.len() {
            self.matrix.remove(row);
        }
    }

    /// Top-`limit` rows scoring strictly above `threshold`, ordered by
    /// descending score with ascending-row-index as the tie-break.
    #[must_use]
    pub fn search(&self, query: &str, limit: usize, threshold: f32) -> Vec<(usize, f32)> {
        let query_vector = self.vectorizer.transform(query);
        let mut scored: Vec<(usize, f32)> = self
            .matrix
            .iter()
            .enumerate()
            .map(|(row, vector)| (row, dot(vector, &query_vector)))
            .filter(|(_, score)| *score > threshold)
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));
        scored.truncate(limit);
        scored
    }

    pub fn save(&self, path: &std::path::Path) -> std::io::Result<()> {
        let bytes = serde_json::to_vec(self)?;
        std::fs::write(path, bytes)
    }

    pub fn load(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(std::io::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_drops_stopwords_from_vocabulary() {
        let docs = vec!["the quick brown fox".to_string()];
        let vectorizer = TfidfVectorizer::fit(&docs, 1000);
        assert!(!vectorizer.vocabulary.contains_key("the"));
        assert!(vectorizer.vocabulary.contains_key("quick"));
    }

    #[test]
    fn transform_is_l2_normalized() {
        let docs = vec!["rust programming language".to_string(), "python programming".to_string()];
        let vectorizer = TfidfVectorizer::fit(&docs, 1000);
        let row = vectorizer.transform("rust programming language");
        let norm: f32 = row.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5 || norm == 0.0);
    }

    #[test]
    fn max_features_caps_vocabulary_size() {
        let docs = vec!["alpha beta gamma delta epsilon zeta eta theta".to_string()];
        let vectorizer = TfidfVectorizer::fit(&docs, 3);
        assert_eq!(vectorizer.vocabulary_len(), 3);
    }

    #[test]
    fn unseen_terms_contribute_nothing() {
        let docs = vec!["rust programming".to_string()];
        let vectorizer = TfidfVectorizer::fit(&docs, 1000);
        let row = vectorizer.transform("completely unrelated query zzz");
        assert!(row.iter().all(|v| *v == 0.0));
    }
}
