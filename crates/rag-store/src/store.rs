//! The document store (C1): identity, dedup, versioning, persistence.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;

use chrono::Utc;
use rag_core::document::compute_content_hash;
use rag_core::{Document, DocumentPatch, DocumentSummary, DocumentType};

use crate::document_file::{self, RawDocument, StoredFile};
use crate::error::RagStoreError;

/// Knobs controlling store behavior, set once at startup from
/// `rag-config`'s `StoreConfig`.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub cache_dir: PathBuf,
    pub dedup_enabled: bool,
    pub versioning_enabled: bool,
    pub auto_migrate_ids: bool,
    pub auto_save: bool,
    pub backup_retention: u32,
}

impl StoreOptions {
    #[must_use]
    pub fn documents_path(&self) -> PathBuf {
        self.cache_dir.join("documents.json")
    }
}

/// Optional filter applied by the `list` tool.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StoreStats {
    pub total_documents: usize,
    pub total_content_bytes: usize,
    pub categories: BTreeMap<String, usize>,
    pub sources: BTreeMap<String, usize>,
    pub top_tags: Vec<(String, usize)>,
    pub oldest: Option<chrono::DateTime<Utc>>,
    pub newest: Option<chrono::DateTime<Utc>>,
    pub unique_hashes: usize,
}

/// The live, in-memory document list plus the lookup structures every
/// mutation and query path uses. Row position in `documents` is the
/// contract C2's matrices align to.
pub struct DocumentStore {
    options: StoreOptions,
    documents: Vec<Document>,
    id_to_pos: HashMap<String, usize>,
    legacy_to_canonical: HashMap<String, String>,
    hash_to_pos: HashMap<String, usize>,
}

impl DocumentStore {
    /// An empty store, not yet backed by any file.
    #[must_use]
    pub fn empty(options: StoreOptions) -> Self {
        Self {
            options,
            documents: Vec::new(),
            id_to_pos: HashMap::new(),
            legacy_to_canonical: HashMap::new(),
            hash_to_pos: HashMap::new(),
        }
    }

    /// Loads from `options.documents_path()`. Missing file or parse
    /// failure degrades to an empty store (never fatal), per
    /// SPEC_FULL.md §4.1.
    pub fn load(options: StoreOptions) -> Result<Self, RagStoreError> {
        let path = options.documents_path();
        let stored = document_file::try_read(&path)?;
        let mut store = Self::empty(options);
        let Some(stored) = stored else {
            return Ok(store);
        };
        for raw in stored.documents {
            store.ingest_migrated(raw);
        }
        Ok(store)
    }

    fn ingest_migrated(&mut self, raw: RawDocument) {
        let legacy_hint = raw.id.clone();
        let migrated = document_file::migrate(raw, self.options.auto_migrate_ids);
        let doc = migrated.document;

        if let Some(&existing_pos) = self.hash_to_pos.get(&doc.content_hash) {
            // Hash-vs-legacy-id conflict: a document already occupies this
            // content hash. Hash wins — merge the legacy alias onto the
            // existing record rather than inserting a duplicate row.
            if let Some(legacy) = doc.legacy_id.or(legacy_hint) {
                let canonical = self.documents[existing_pos].id.clone();
                tracing::warn!(
                    legacy_id = %legacy,
                    existing_id = %canonical,
                    "legacy id collides with an existing document by content hash; hash wins"
                );
                self.legacy_to_canonical.insert(legacy, canonical);
            }
            return;
        }

        let pos = self.documents.len();
        self.id_to_pos.insert(doc.id.clone(), pos);
        if let Some(legacy) = &doc.legacy_id {
            self.legacy_to_canonical.insert(legacy.clone(), doc.id.clone());
        }
        self.hash_to_pos.insert(doc.content_hash.clone(), pos);
        self.documents.push(doc);
    }

    /// Resolves a canonical or legacy id to the canonical id, if known.
    #[must_use]
    pub fn resolve(&self, id: &str) -> Option<String> {
        if self.id_to_pos.contains_key(id) {
            return Some(id.to_string());
        }
        self.legacy_to_canonical.get(id).cloned()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Document> {
        let canonical = self.resolve(id)?;
        self.id_to_pos.get(&canonical).map(|&pos| &self.documents[pos])
    }

    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    #[must_use]
    pub fn position_of(&self, id: &str) -> Option<usize> {
        let canonical = self.resolve(id)?;
        self.id_to_pos.get(&canonical).copied()
    }

    /// Inserts a new document, or — if dedup is enabled and the content
    /// hash already exists — updates and returns the existing one.
    /// Returns the resulting document and whether the dedup path was
    /// taken.
    pub fn add(
        &mut self,
        title: String,
        content: String,
        doc_type: DocumentType,
        source: Option<String>,
        category: Option<String>,
        tags: BTreeSet<String>,
    ) -> Result<(Document, bool), RagStoreError> {
        let hash = compute_content_hash(&title, &content);

        if self.options.dedup_enabled {
            if let Some(&pos) = self.hash_to_pos.get(&hash) {
                let doc = &mut self.documents[pos];
                doc.updated_at = Utc::now();
                if self.options.versioning_enabled {
                    doc.version += 1;
                }
                doc.tags.extend(tags);
                let result = doc.clone();
                self.persist_if_auto_save()?;
                return Ok((result, true));
            }
        }

        let doc = Document::new(title, content, doc_type, source, category, tags);
        let pos = self.documents.len();
        self.id_to_pos.insert(doc.id.clone(), pos);
        self.hash_to_pos.insert(doc.content_hash.clone(), pos);
        self.documents.push(doc.clone());
        self.persist_if_auto_save()?;
        Ok((doc, false))
    }

    /// Applies `patch` to the document resolved from `id`. Returns `false`
    /// (not an error) if `id` does not resolve.
    pub fn update(&mut self, id: &str, patch: DocumentPatch) -> Result<bool, RagStoreError> {
        let Some(pos) = self.position_of(id) else {
            return Ok(false);
        };
        if patch.is_empty() {
            return Ok(true);
        }

        let recompute_hash = patch.changes_content();
        let old_hash = self.documents[pos].content_hash.clone();

        {
            let doc = &mut self.documents[pos];
            if let Some(title) = patch.title {
                doc.title = title;
            }
            if let Some(content) = patch.content {
                doc.content = content;
            }
            if let Some(tags) = patch.tags {
                doc.tags = tags;
            }
            if let Some(category) = patch.category {
                doc.category = category;
            }
            if let Some(metadata) = patch.metadata {
                doc.metadata = metadata;
            }
            if recompute_hash {
                doc.refresh_hash();
            }
            doc.updated_at = Utc::now();
            doc.version += 1;
        }

        if recompute_hash {
            let new_hash = self.documents[pos].content_hash.clone();
            if old_hash != new_hash {
                self.hash_to_pos.remove(&old_hash);
                self.hash_to_pos.insert(new_hash, pos);
            }
        }

        self.persist_if_auto_save()?;
        Ok(true)
    }

    /// Removes the document resolved from `id`, shifting subsequent row
    /// positions down by one so C2's matrices can mirror the deletion by
    /// contiguous removal. Returns `false` if `id` does not resolve.
    pub fn remove(&mut self, id: &str) -> Result<bool, RagStoreError> {
        let Some(pos) = self.position_of(id) else {
            return Ok(false);
        };
        let removed = self.documents.remove(pos);
        self.hash_to_pos.remove(&removed.content_hash);
        self.id_to_pos.remove(&removed.id);
        self.legacy_to_canonical.retain(|_, canonical| canonical != &removed.id);

        for (_, p) in self.id_to_pos.iter_mut() {
            if *p > pos {
                *p -= 1;
            }
        }
        for (_, p) in self.hash_to_pos.iter_mut() {
            if *p > pos {
                *p -= 1;
            }
        }

        self.persist_if_auto_save()?;
        Ok(true)
    }

    #[must_use]
    pub fn list(&self, filter: &ListFilter) -> Vec<DocumentSummary> {
        self.documents
            .iter()
            .filter(|doc| {
                filter
                    .category
                    .as_ref()
                    .is_none_or(|c| doc.category.eq_ignore_ascii_case(c))
            })
            .filter(|doc| {
                filter.tags.is_empty()
                    || filter.tags.iter().any(|t| {
                        doc.tags.iter().any(|dt| dt.eq_ignore_ascii_case(t))
                    })
            })
            .filter(|doc| {
                filter
                    .source
                    .as_ref()
                    .is_none_or(|s| doc.source.as_deref() == Some(s.as_str()))
            })
            .map(Document::summary)
            .collect()
    }

    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let mut categories = BTreeMap::new();
        let mut sources = BTreeMap::new();
        let mut tag_counts: HashMap<String, usize> = HashMap::new();
        let mut total_content_bytes = 0usize;
        let mut oldest = None;
        let mut newest = None;
        let mut unique_hashes: BTreeMap<&str, ()> = BTreeMap::new();

        for doc in &self.documents {
            *categories.entry(doc.category.clone()).or_insert(0) += 1;
            if let Some(source) = &doc.source {
                *sources.entry(source.clone()).or_insert(0) += 1;
            }
            for tag in &doc.tags {
                *tag_counts.entry(tag.clone()).or_insert(0) += 1;
            }
            total_content_bytes += doc.content.len();
            unique_hashes.insert(&doc.content_hash, ());
            oldest = Some(oldest.map_or(doc.created_at, |o: chrono::DateTime<Utc>| o.min(doc.created_at)));
            newest = Some(newest.map_or(doc.updated_at, |n: chrono::DateTime<Utc>| n.max(doc.updated_at)));
        }

        let mut top_tags: Vec<(String, usize)> = tag_counts.into_iter().collect();
        top_tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_tags.truncate(10);

        StoreStats {
            total_documents: self.documents.len(),
            total_content_bytes,
            categories,
            sources,
            top_tags,
            oldest,
            newest,
            unique_hashes: unique_hashes.len(),
        }
    }

    pub fn save(&self) -> Result<(), RagStoreError> {
        let raw_documents: Vec<RawDocument> = self
            .documents
            .iter()
            .map(|doc| RawDocument {
                id: Some(doc.id.clone()),
                title: Some(doc.title.clone()),
                content: Some(doc.content.clone()),
                doc_type: Some(format!("{:?}", doc.doc_type).to_lowercase()),
                source: doc.source.clone(),
                category: Some(doc.category.clone()),
                tags: Some(doc.tags.clone()),
                content_hash: Some(doc.content_hash.clone()),
                created_at: Some(doc.created_at),
                updated_at: Some(doc.updated_at),
                version: Some(doc.version),
                metadata: Some(doc.metadata.clone()),
            })
            .collect();
        let file = StoredFile {
            metadata: document_file::file_metadata(self.documents.len()),
            documents: raw_documents,
        };
        document_file::write_atomic(
            &self.options.documents_path(),
            &file,
            self.options.backup_retention,
        )
    }

    fn persist_if_auto_save(&self) -> Result<(), RagStoreError> {
        if self.options.auto_save {
            self.save()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn options(dir: &std::path::Path) -> StoreOptions {
        StoreOptions {
            cache_dir: dir.to_path_buf(),
            dedup_enabled: true,
            versioning_enabled: true,
            auto_migrate_ids: true,
            auto_save: true,
            backup_retention: 2,
        }
    }

    #[test]
    fn add_and_get_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::empty(options(dir.path()));
        let (doc, deduped) = store
            .add(
                "Title".into(),
                "Content".into(),
                DocumentType::Text,
                None,
                None,
                BTreeSet::new(),
            )
            .unwrap();
        assert!(!deduped);
        assert_eq!(store.get(&doc.id).unwrap().title, "Title");
    }

    #[test]
    fn dedup_bumps_version_and_unions_tags() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::empty(options(dir.path()));
        let mut tags_a = BTreeSet::new();
        tags_a.insert("a".to_string());
        let (first, _) = store
            .add("Dup".into(), "same".into(), DocumentType::Text, None, None, tags_a)
            .unwrap();
        assert_eq!(first.version, 1);

        let mut tags_b = BTreeSet::new();
        tags_b.insert("b".to_string());
        let (second, deduped) = store
            .add("Dup 2".into(), "same".into(), DocumentType::Text, None, None, tags_b)
            .unwrap();
        assert!(deduped);
        assert_eq!(second.id, first.id);
        assert_eq!(second.version, 2);
        assert!(second.tags.contains("a") && second.tags.contains("b"));
        assert_eq!(store.documents().len(), 1);
    }

    #[test]
    fn remove_drops_row_and_shifts_positions() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::empty(options(dir.path()));
        let (a, _) = store
            .add("A".into(), "a".into(), DocumentType::Text, None, None, BTreeSet::new())
            .unwrap();
        let (b, _) = store
            .add("B".into(), "b".into(), DocumentType::Text, None, None, BTreeSet::new())
            .unwrap();
        let (c, _) = store
            .add("C".into(), "c".into(), DocumentType::Text, None, None, BTreeSet::new())
            .unwrap();

        assert!(store.remove(&b.id).unwrap());
        assert_eq!(store.documents().len(), 2);
        assert_eq!(store.position_of(&a.id), Some(0));
        assert_eq!(store.position_of(&c.id), Some(1));
    }

    #[test]
    fn update_refreshes_hash_and_bumps_version() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::empty(options(dir.path()));
        let (doc, _) = store
            .add("T".into(), "old".into(), DocumentType::Text, None, None, BTreeSet::new())
            .unwrap();
        let patch = DocumentPatch {
            content: Some("new".into()),
            ..Default::default()
        };
        assert!(store.update(&doc.id, patch).unwrap());
        let updated = store.get(&doc.id).unwrap();
        assert_eq!(updated.content, "new");
        assert_eq!(updated.version, 2);
    }

    #[test]
    fn update_unknown_id_returns_false_not_error() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::empty(options(dir.path()));
        let patch = DocumentPatch {
            content: Some("x".into()),
            ..Default::default()
        };
        assert!(!store.update("does-not-exist", patch).unwrap());
    }

    #[test]
    fn save_then_load_round_trips_documents() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::empty(options(dir.path()));
        store
            .add("T".into(), "C".into(), DocumentType::Text, None, None, BTreeSet::new())
            .unwrap();
        store.save().unwrap();

        let reloaded = DocumentStore::load(options(dir.path())).unwrap();
        assert_eq!(reloaded.documents().len(), 1);
        assert_eq!(reloaded.documents()[0].content_hash, store.documents()[0].content_hash);
    }

    #[test]
    fn legacy_id_resolves_to_canonical_for_update_and_remove() {
        let dir = tempdir().unwrap();
        let path = options(dir.path()).documents_path();
        std::fs::create_dir_all(dir.path()).unwrap();
        let legacy_json = serde_json::json!({
            "metadata": {"schema_version": 1, "document_count": 1},
            "documents": [{
                "id": "doc_1754900000000",
                "title": "Legacy",
                "content": "old content"
            }]
        });
        std::fs::write(&path, serde_json::to_vec(&legacy_json).unwrap()).unwrap();

        let mut store = DocumentStore::load(options(dir.path())).unwrap();
        assert!(store
            .update("doc_1754900000000", DocumentPatch { content: Some("new".into()), ..Default::default() })
            .unwrap());
        assert!(store.remove("doc_1754900000000").unwrap());
        assert!(store.documents().is_empty());
    }
}
