//! The [`Document`] record: the atomic unit of the store.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ids::new_canonical_id;

/// Coarse content category. Unknown values on ingest fold to [`DocumentType::Text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Text,
    Webpage,
    Documentation,
    Code,
    Markdown,
    Chat,
}

impl Default for DocumentType {
    fn default() -> Self {
        Self::Text
    }
}

impl std::str::FromStr for DocumentType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "webpage" => Self::Webpage,
            "documentation" => Self::Documentation,
            "code" => Self::Code,
            "markdown" => Self::Markdown,
            "chat" => Self::Chat,
            _ => Self::Text,
        })
    }
}

/// Default category assigned when none is supplied on ingest.
pub const DEFAULT_CATEGORY: &str = "uncategorized";

/// A single ingested text artifact with metadata; the atomic unit of
/// storage and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Canonical (UUIDv4) identifier, stable for the document's lifetime.
    pub id: String,

    /// Non-canonical identifier carried over from a prior schema, if the
    /// document was ingested with one. Resolved to `id` by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_id: Option<String>,

    pub title: String,
    pub content: String,

    #[serde(default)]
    pub doc_type: DocumentType,

    #[serde(default)]
    pub source: Option<String>,

    #[serde(default = "default_category")]
    pub category: String,

    /// Case-insensitive for lookup; original case preserved here for display.
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Full SHA-256 hex digest over `title ⧺ content`.
    pub content_hash: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Monotonic, starts at 1.
    #[serde(default = "default_version")]
    pub version: u64,

    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_version() -> u64 {
    1
}

impl Document {
    /// Builds a brand-new document: assigns a fresh canonical id, computes
    /// the content hash, and sets both timestamps to `now`.
    #[must_use]
    pub fn new(
        title: String,
        content: String,
        doc_type: DocumentType,
        source: Option<String>,
        category: Option<String>,
        tags: BTreeSet<String>,
    ) -> Self {
        let now = Utc::now();
        let content_hash = compute_content_hash(&title, &content);
        Self {
            id: new_canonical_id(),
            legacy_id: None,
            title,
            content,
            doc_type,
            source,
            category: category.unwrap_or_else(default_category),
            tags,
            content_hash,
            created_at: now,
            updated_at: now,
            version: 1,
            metadata: BTreeMap::new(),
        }
    }

    /// First 16 hex characters of [`Document::content_hash`].
    #[must_use]
    pub fn short_hash(&self) -> &str {
        &self.content_hash[..16.min(self.content_hash.len())]
    }

    /// Recomputes `content_hash` from the current `title`/`content`.
    pub fn refresh_hash(&mut self) {
        self.content_hash = compute_content_hash(&self.title, &self.content);
    }

    #[must_use]
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            category: self.category.clone(),
            tags: self.tags.clone(),
            source: self.source.clone(),
            doc_type: self.doc_type,
            created_at: self.created_at,
            updated_at: self.updated_at,
            version: self.version,
            content_hash: self.short_hash().to_string(),
            content_preview: truncate_with_ellipsis(&self.content, 200),
        }
    }
}

/// SHA-256 over `title ⧺ content`, rendered as a lowercase hex string.
#[must_use]
pub fn compute_content_hash(title: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Truncates `text` to at most `max_chars` characters, appending an
/// ellipsis marker when truncation occurred.
#[must_use]
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

/// Lightweight view of a [`Document`] returned by `list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub category: String,
    pub tags: BTreeSet<String>,
    pub source: Option<String>,
    pub doc_type: DocumentType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
    pub content_hash: String,
    pub content_preview: String,
}

/// A partial update applied by the `update` tool. Absent fields are left
/// unchanged; `id` and `created_at` can never be patched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<BTreeSet<String>>,
    pub category: Option<String>,
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
}

impl DocumentPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.tags.is_none()
            && self.category.is_none()
            && self.metadata.is_none()
    }

    #[must_use]
    pub fn changes_content(&self) -> bool {
        self.title.is_some() || self.content.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_document_has_version_one_and_equal_timestamps_on_creation() {
        let doc = Document::new(
            "T".into(),
            "C".into(),
            DocumentType::Text,
            None,
            None,
            BTreeSet::new(),
        );
        assert_eq!(doc.version, 1);
        assert!(doc.created_at <= doc.updated_at);
        assert_eq!(doc.category, DEFAULT_CATEGORY);
    }

    #[test]
    fn short_hash_is_prefix_of_full_hash() {
        let doc = Document::new(
            "T".into(),
            "C".into(),
            DocumentType::Text,
            None,
            None,
            BTreeSet::new(),
        );
        assert!(doc.content_hash.starts_with(doc.short_hash()));
        assert_eq!(doc.short_hash().len(), 16);
    }

    #[test]
    fn hash_is_stable_for_identical_title_and_content() {
        let a = compute_content_hash("same title", "same content");
        let b = compute_content_hash("same title", "same content");
        assert_eq!(a, b);
    }

    #[test]
    fn hash_differs_when_content_differs() {
        let a = compute_content_hash("T", "one");
        let b = compute_content_hash("T", "two");
        assert_ne!(a, b);
    }

    #[test]
    fn unknown_type_string_folds_to_text() {
        use std::str::FromStr;
        assert_eq!(DocumentType::from_str("nonsense").unwrap(), DocumentType::Text);
    }

    #[test]
    fn truncate_adds_ellipsis_only_when_needed() {
        assert_eq!(truncate_with_ellipsis("short", 200), "short");
        let long = "a".repeat(10);
        assert_eq!(truncate_with_ellipsis(&long, 5), "aaaaa...");
    }
}
