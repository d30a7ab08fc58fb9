//! C3: the retrieval engine. Cascades dense → sparse → substring,
//! stopping at the first tier that yields results.

use rag_core::Document;
use rag_embeddings::DenseEmbedder;
use serde::Serialize;

use crate::indices::DerivedIndices;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchTier {
    Dense,
    Sparse,
    Substring,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
    pub tier: SearchTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// Ranking configuration the cascade needs at call time. Kept separate
/// from `rag-config`'s `SearchConfig` so this crate does not depend on
/// `rag-config`; the RPC layer translates one into the other.
#[derive(Debug, Clone, Copy)]
pub struct CascadeThresholds {
    pub dense: f32,
    pub sparse: f32,
}

/// Runs the search cascade over `documents`/`indices`. Empty query, empty
/// corpus, or `limit == 0` all short-circuit to an empty result, per
/// SPEC_FULL.md §4.3's edge-case policy.
#[must_use]
pub fn search(
    documents: &[Document],
    indices: &DerivedIndices,
    embedder: Option<&DenseEmbedder>,
    query: &str,
    limit: usize,
    thresholds: CascadeThresholds,
) -> Vec<ScoredDocument> {
    if query.trim().is_empty() || documents.is_empty() || limit == 0 {
        return Vec::new();
    }

    if let (Some(dense), Some(embedder)) = (&indices.dense, embedder) {
        match embedder.embed_one(query) {
            Ok(query_vector) => {
                let hits = dense.search(&query_vector, limit, thresholds.dense);
                if !hits.is_empty() {
                    return hits
                        .into_iter()
                        .map(|(row, score)| ScoredDocument {
                            document: documents[row].clone(),
                            score,
                            tier: SearchTier::Dense,
                            snippet: None,
                        })
                        .collect();
                }
            }
            Err(error) => {
                tracing::warn!(%error, "dense tier encode failed, falling through");
            }
        }
    }

    if let Some(sparse) = &indices.sparse {
        let hits = sparse.search(query, limit, thresholds.sparse);
        if !hits.is_empty() {
            return hits
                .into_iter()
                .map(|(row, score)| ScoredDocument {
                    document: documents[row].clone(),
                    score,
                    tier: SearchTier::Sparse,
                    snippet: None,
                })
                .collect();
        }
    }

    substring_search(documents, query, limit)
}

fn substring_search(documents: &[Document], query: &str, limit: usize) -> Vec<ScoredDocument> {
    let needle = query.to_lowercase();
    let mut scored: Vec<(usize, f32)> = documents
        .iter()
        .enumerate()
        .map(|(row, doc)| (row, substring_score(&needle, doc)))
        .filter(|(_, score)| *score > 0.0)
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));
    scored.truncate(limit);
    scored
        .into_iter()
        .map(|(row, score)| ScoredDocument {
            document: documents[row].clone(),
            score,
            tier: SearchTier::Substring,
            snippet: extract_snippet(&needle, &documents[row].content, 60),
        })
        .collect()
}

fn substring_score(lower_needle: &str, doc: &Document) -> f32 {
    let tags_joined = doc.tags.iter().cloned().collect::<Vec<_>>().join(" ");
    let haystack = format!("{} {} {}", doc.title, doc.content, tags_joined).to_lowercase();
    let word_count = haystack.split_whitespace().count().max(1);
    #[allow(clippy::cast_precision_loss)]
    let count = haystack.matches(lower_needle).count() as f32;
    count / word_count as f32
}

fn extract_snippet(lower_needle: &str, content: &str, context: usize) -> Option<String> {
    let lower_content = content.to_lowercase();
    let byte_pos = lower_content.find(lower_needle)?;
    let start = char_boundary_down(content, byte_pos.saturating_sub(context));
    let end = char_boundary_up(content, (byte_pos + lower_needle.len() + context).min(content.len()));
    Some(format!("...{}...", &content[start..end]))
}

fn char_boundary_down(s: &str, mut idx: usize) -> usize {
    idx = idx.min(s.len());
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn char_boundary_up(s: &str, mut idx: usize) -> usize {
    idx = idx.min(s.len());
    while idx < s.len() && !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

/// `search_by_tags`: union of id sets per lower-cased tag, de-duplicated,
/// insertion order, truncated to `limit`.
#[must_use]
pub fn search_by_tags(documents: &[Document], indices: &DerivedIndices, tags: &[String], limit: usize) -> Vec<Document> {
    indices
        .attributes
        .ids_for_tags(tags)
        .into_iter()
        .take(limit)
        .filter_map(|id| documents.iter().find(|d| d.id == id).cloned())
        .collect()
}

/// `search_by_category`: lookup in the category index, insertion order,
/// truncated to `limit`.
#[must_use]
pub fn search_by_category(documents: &[Document], indices: &DerivedIndices, category: &str, limit: usize) -> Vec<Document> {
    indices
        .attributes
        .ids_for_category(category)
        .into_iter()
        .take(limit)
        .filter_map(|id| documents.iter().find(|d| d.id == id).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rag_core::DocumentType;
    use std::collections::BTreeSet;

    fn doc(title: &str, content: &str) -> Document {
        Document::new(title.into(), content.into(), DocumentType::Text, None, None, BTreeSet::new())
    }

    #[test]
    fn empty_query_returns_empty() {
        let documents = vec![doc("A", "hello")];
        let indices = DerivedIndices::build(&documents, None, false, false, 1000).unwrap();
        let results = search(&documents, &indices, None, "", 5, CascadeThresholds { dense: 0.1, sparse: 0.05 });
        assert!(results.is_empty());
    }

    #[rstest::rstest]
    #[case::empty_corpus(Vec::new(), "hello", 5)]
    #[case::zero_limit(vec![doc("A", "hello world")], "hello", 0)]
    fn short_circuits_return_empty(#[case] documents: Vec<Document>, #[case] query: &str, #[case] limit: usize) {
        let indices = DerivedIndices::build(&documents, None, false, false, 1000).unwrap();
        let results = search(&documents, &indices, None, query, limit, CascadeThresholds { dense: 0.1, sparse: 0.05 });
        assert!(results.is_empty());
    }

    #[test]
    fn falls_back_to_substring_tier_when_dense_and_sparse_disabled() {
        let documents = vec![doc("T", "hello world")];
        let indices = DerivedIndices::build(&documents, None, false, false, 1000).unwrap();
        let results = search(&documents, &indices, None, "hello", 5, CascadeThresholds { dense: 0.1, sparse: 0.05 });
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].tier, SearchTier::Substring);
        assert!(results[0].score > 0.0);
    }

    #[test]
    fn sparse_tier_used_when_dense_unavailable() {
        let documents = vec![
            doc("Python Guide", "python programming language basics"),
            doc("Unrelated", "something else entirely about cooking"),
        ];
        let indices = DerivedIndices::build(&documents, None, false, true, 1000).unwrap();
        let results = search(&documents, &indices, None, "python programming", 5, CascadeThresholds { dense: 0.1, sparse: 0.0 });
        assert!(!results.is_empty());
        assert_eq!(results[0].tier, SearchTier::Sparse);
    }

    #[test]
    fn search_by_tags_is_case_insensitive_union() {
        let mut a = doc("A", "a");
        a.tags.insert("rust".to_string());
        let mut b = doc("B", "b");
        b.tags.insert("python".to_string());
        let documents = vec![a, b];
        let indices = DerivedIndices::build(&documents, None, false, false, 1000).unwrap();
        let results = search_by_tags(&documents, &indices, &["RUST".to_string(), "python".to_string()], 10);
        assert_eq!(results.len(), 2);
    }
}
