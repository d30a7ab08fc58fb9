//! Snapshot assembly (C6 step 5) and publication to the Stream Hub.

use chrono::{DateTime, Utc};
use rag_core::Document;
use serde::Serialize;

use crate::predicate::ProjectionPredicate;
use crate::projection::ProjectedDocument;

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotMetadata {
    pub total: usize,
    pub last_sync: DateTime<Utc>,
    pub source: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub documents: Vec<ProjectedDocument>,
    pub metadata: SnapshotMetadata,
}

impl Snapshot {
    /// Builds a snapshot of every document matching `predicate`.
    /// `last_sync` must be non-decreasing across calls from the same
    /// watcher; the caller is responsible for that monotonicity (see
    /// [`crate::watcher::Watcher`]).
    #[must_use]
    pub fn build(documents: &[Document], predicate: &ProjectionPredicate, default_url: Option<&str>, last_sync: DateTime<Utc>, source: &str) -> Self {
        let projected: Vec<ProjectedDocument> = documents
            .iter()
            .filter(|doc| predicate.matches(doc))
            .map(|doc| ProjectedDocument::from_document(doc, default_url))
            .collect();
        let total = projected.len();
        Self {
            documents: projected,
            metadata: SnapshotMetadata {
                total,
                last_sync,
                source: source.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rag_core::DocumentType;
    use std::collections::BTreeSet;

    #[test]
    fn snapshot_total_matches_filtered_count() {
        let mut a2a = Document::new("A".into(), "content".into(), DocumentType::Text, None, None, BTreeSet::new());
        a2a.category = "a2a-tasks".into();
        let other = Document::new("B".into(), "content".into(), DocumentType::Text, None, None, BTreeSet::new());
        let documents = vec![a2a, other];
        let snapshot = Snapshot::build(&documents, &ProjectionPredicate::a2a_default(), None, Utc::now(), "documents.json");
        assert_eq!(snapshot.metadata.total, 1);
        assert_eq!(snapshot.documents.len(), 1);
    }
}
