//! Per-document projection shape (C6 step 4) — grounded on
//! `sync-rag-frontend.py`'s `format_for_frontend`: a stable, frontend-
//! oriented view distinct from the engine's own `Document`/`DocumentSummary`.

use chrono::{DateTime, Utc};
use rag_core::document::truncate_with_ellipsis;
use rag_core::Document;
use serde::Serialize;

const CONTENT_PREVIEW_CHARS: usize = 500;
const SOURCE_MARKER_PREFIX: &str = "Fonte:";

#[derive(Debug, Clone, Serialize)]
pub struct ProjectionMetadata {
    pub source: Option<String>,
    pub content_hash: String,
    pub version: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectedDocument {
    pub id: String,
    pub url: Option<String>,
    pub title: String,
    pub content: String,
    pub full_content: String,
    pub category: String,
    pub tags: Vec<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: ProjectionMetadata,
}

impl ProjectedDocument {
    /// Projects `document` for frontend consumption. `default_url` is the
    /// configured fallback used when no URL can be recovered from the
    /// content or the source field.
    #[must_use]
    pub fn from_document(document: &Document, default_url: Option<&str>) -> Self {
        Self {
            id: document.id.clone(),
            url: extract_url(document, default_url),
            title: document.title.clone(),
            content: truncate_with_ellipsis(&document.content, CONTENT_PREVIEW_CHARS),
            full_content: document.content.clone(),
            category: document.category.clone(),
            tags: document.tags.iter().cloned().collect(),
            doc_type: format!("{:?}", document.doc_type).to_lowercase(),
            timestamp: document.updated_at,
            metadata: ProjectionMetadata {
                source: document.source.clone(),
                content_hash: document.short_hash().to_string(),
                version: document.version,
            },
        }
    }
}

/// Recovers a URL three ways, in order: a `Fonte: <url>` marker line in
/// the content, the `source` field when it already looks like a URL, or
/// the configured default.
fn extract_url(document: &Document, default_url: Option<&str>) -> Option<String> {
    for line in document.content.lines().take(5) {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix(SOURCE_MARKER_PREFIX) {
            let candidate = rest.trim();
            if !candidate.is_empty() {
                return Some(candidate.to_string());
            }
        }
    }
    if let Some(source) = &document.source {
        if looks_like_url(source) {
            return Some(source.clone());
        }
    }
    default_url.map(str::to_string)
}

fn looks_like_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rag_core::DocumentType;
    use std::collections::BTreeSet;

    #[test]
    fn content_is_truncated_with_ellipsis_past_500_chars() {
        let long_content = "x".repeat(600);
        let doc = Document::new("T".into(), long_content.clone(), DocumentType::Text, None, None, BTreeSet::new());
        let projected = ProjectedDocument::from_document(&doc, None);
        assert_eq!(projected.content.chars().count(), 503);
        assert!(projected.content.ends_with("..."));
        assert_eq!(projected.full_content, long_content);
    }

    #[test]
    fn url_extracted_from_fonte_marker_line() {
        let content = "Fonte: https://example.com/page\nBody text here.".to_string();
        let doc = Document::new("T".into(), content, DocumentType::Text, None, None, BTreeSet::new());
        let projected = ProjectedDocument::from_document(&doc, None);
        assert_eq!(projected.url.as_deref(), Some("https://example.com/page"));
    }

    #[test]
    fn url_falls_back_to_source_field_when_it_looks_like_a_url() {
        let doc = Document::new(
            "T".into(),
            "no marker here".into(),
            DocumentType::Text,
            Some("https://example.org".into()),
            None,
            BTreeSet::new(),
        );
        let projected = ProjectedDocument::from_document(&doc, None);
        assert_eq!(projected.url.as_deref(), Some("https://example.org"));
    }

    #[test]
    fn url_falls_back_to_configured_default() {
        let doc = Document::new("T".into(), "plain".into(), DocumentType::Text, None, None, BTreeSet::new());
        let projected = ProjectedDocument::from_document(&doc, Some("https://default.example"));
        assert_eq!(projected.url.as_deref(), Some("https://default.example"));
    }
}
