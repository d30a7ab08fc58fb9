//! The projection predicate (C6 step 3): a pluggable value, not a
//! hard-coded constant. The server wires in the `a2a`-family default and
//! may replace it at startup from configuration.

use rag_core::Document;

/// A small predicate description, serializable so it can be expressed as
/// configuration rather than compiled in.
#[derive(Debug, Clone)]
pub struct ProjectionPredicate {
    tag_substring: String,
    category_prefix: String,
    source_domain_substring: String,
}

impl ProjectionPredicate {
    #[must_use]
    pub fn new(tag_substring: impl Into<String>, category_prefix: impl Into<String>, source_domain_substring: impl Into<String>) -> Self {
        Self {
            tag_substring: tag_substring.into(),
            category_prefix: category_prefix.into(),
            source_domain_substring: source_domain_substring.into(),
        }
    }

    /// The default: tag contains `a2a`, category starts with `a2a`, or the
    /// source domain contains `a2aprotocol`.
    #[must_use]
    pub fn a2a_default() -> Self {
        Self::new("a2a", "a2a", "a2aprotocol")
    }

    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        let tag_hit = document
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(&self.tag_substring));
        let category_hit = document.category.to_lowercase().starts_with(&self.category_prefix);
        let source_hit = document
            .source
            .as_deref()
            .is_some_and(|source| source.to_lowercase().contains(&self.source_domain_substring));
        tag_hit || category_hit || source_hit
    }
}
