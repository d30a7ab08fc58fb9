//! Attribute inverted indices: tag → ids, category → ids, id → row.

use std::collections::HashMap;

use rag_core::Document;

#[derive(Debug, Clone, Default)]
pub struct AttributeIndices {
    /// Lower-cased tag → ids, in insertion order.
    tag_index: HashMap<String, Vec<String>>,
    /// Lower-cased category → ids, in insertion order.
    category_index: HashMap<String, Vec<String>>,
    id_to_row: HashMap<String, usize>,
}

impl AttributeIndices {
    #[must_use]
    pub fn build(documents: &[Document]) -> Self {
        let mut indices = Self::default();
        for (row, doc) in documents.iter().enumerate() {
            indices.id_to_row.insert(doc.id.clone(), row);
            for tag in &doc.tags {
                indices
                    .tag_index
                    .entry(tag.to_lowercase())
                    .or_default()
                    .push(doc.id.clone());
            }
            indices
                .category_index
                .entry(doc.category.to_lowercase())
                .or_default()
                .push(doc.id.clone());
        }
        indices
    }

    #[must_use]
    pub fn row_of(&self, id: &str) -> Option<usize> {
        self.id_to_row.get(id).copied()
    }

    /// Union of id sets for each lower-cased tag in `tags`, de-duplicated,
    /// preserving first-seen (insertion) order.
    #[must_use]
    pub fn ids_for_tags(&self, tags: &[String]) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut result = Vec::new();
        for tag in tags {
            if let Some(ids) = self.tag_index.get(&tag.to_lowercase()) {
                for id in ids {
                    if seen.insert(id.clone()) {
                        result.push(id.clone());
                    }
                }
            }
        }
        result
    }

    #[must_use]
    pub fn ids_for_category(&self, category: &str) -> Vec<String> {
        self.category_index
            .get(&category.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }
}
