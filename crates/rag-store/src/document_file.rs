//! On-disk shape of `documents.json`, tolerant raw parsing for
//! migration-on-load, and atomic persistence with backup rotation.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rag_core::document::{compute_content_hash, DEFAULT_CATEGORY};
use rag_core::ids::{is_canonical_id, new_canonical_id};
use rag_core::{Document, DocumentType};
use serde::{Deserialize, Serialize};

use crate::error::RagStoreError;

const SCHEMA_VERSION: u32 = 2;

/// The full on-disk file: an ordered document list plus a metadata block.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredFile {
    #[serde(default)]
    pub metadata: FileMetadata,
    #[serde(default)]
    pub documents: Vec<RawDocument>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FileMetadata {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub document_count: usize,
}

/// A document as it may appear in a file written by an older schema
/// version: every field is optional so loading never fails outright on a
/// stale shape. See [`migrate`].
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<BTreeSet<String>>,
    #[serde(default)]
    pub content_hash: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version: Option<u64>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
}

/// Outcome of migrating one raw, possibly-legacy document.
pub struct Migrated {
    pub document: Document,
    /// `true` if `id` was present but did not parse as a canonical id.
    pub had_legacy_id: bool,
}

/// Fills in every field a pre-migration record might be missing and
/// resolves legacy identifiers, per SPEC_FULL.md §4.1.
#[must_use]
pub fn migrate(raw: RawDocument, auto_migrate_ids: bool) -> Migrated {
    let title = raw.title.unwrap_or_default();
    let content = raw.content.unwrap_or_default();
    let content_hash = raw
        .content_hash
        .unwrap_or_else(|| compute_content_hash(&title, &content));

    let (id, legacy_id, had_legacy_id) = match raw.id {
        None => (new_canonical_id(), None, false),
        Some(existing) if is_canonical_id(&existing) => (existing, None, false),
        Some(existing) if auto_migrate_ids => (new_canonical_id(), Some(existing), true),
        Some(existing) => (existing, None, false),
    };

    let created_at = raw.created_at.unwrap_or_else(Utc::now);
    let updated_at = raw.updated_at.unwrap_or(created_at);

    let document = Document {
        id,
        legacy_id,
        title,
        content,
        doc_type: raw
            .doc_type
            .as_deref()
            .and_then(|s| DocumentType::from_str(s).ok())
            .unwrap_or_default(),
        source: raw.source,
        category: raw.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        tags: raw.tags.unwrap_or_default(),
        content_hash,
        created_at,
        updated_at,
        version: raw.version.unwrap_or(1),
        metadata: raw.metadata.unwrap_or_default(),
    };

    Migrated {
        document,
        had_legacy_id,
    }
}

/// Reads and parses `path`. Returns `Ok(None)` if the file does not exist.
/// A parse failure degrades the same way, per SPEC_FULL.md §4.1's
/// never-fatal load policy — callers log and treat it as absent.
pub fn try_read(path: &Path) -> Result<Option<StoredFile>, RagStoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(path)?;
    match serde_json::from_slice::<StoredFile>(&bytes) {
        Ok(file) => Ok(Some(file)),
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "document file failed to parse, degrading to empty store");
            Ok(None)
        }
    }
}

/// Writes `file` to `path` atomically (write to a sibling temp file, then
/// rename), optionally rotating a timestamped backup of the previous
/// contents first.
pub fn write_atomic(
    path: &Path,
    file: &StoredFile,
    backup_retention: u32,
) -> Result<(), RagStoreError> {
    if backup_retention > 0 && path.exists() {
        rotate_backup(path, backup_retention)?;
    }
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("documents.json")
    ));
    let bytes = serde_json::to_vec_pretty(file)?;
    fs::write(&tmp_path, bytes)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn rotate_backup(path: &Path, retention: u32) -> Result<(), RagStoreError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("documents.json")
        .to_string();
    let stamp = Utc::now().timestamp_millis();
    let backup_path = parent.join(format!("{file_name}.bak.{stamp}"));
    fs::copy(path, &backup_path)?;

    let prefix = format!("{file_name}.bak.");
    let mut backups: Vec<_> = fs::read_dir(parent)?
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            name.starts_with(&prefix).then_some(name)
        })
        .collect();
    backups.sort();
    while backups.len() > retention as usize {
        let oldest = backups.remove(0);
        let _ = fs::remove_file(parent.join(oldest));
    }
    Ok(())
}

pub fn file_metadata(document_count: usize) -> FileMetadata {
    FileMetadata {
        schema_version: SCHEMA_VERSION,
        last_updated: Some(Utc::now()),
        document_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_assigns_canonical_id_when_missing() {
        let raw = RawDocument {
            title: Some("T".into()),
            content: Some("C".into()),
            ..Default::default()
        };
        let migrated = migrate(raw, true);
        assert!(is_canonical_id(&migrated.document.id));
        assert!(!migrated.had_legacy_id);
    }

    #[test]
    fn migrate_preserves_legacy_timestamp_id() {
        let raw = RawDocument {
            id: Some("doc_1754900000000".into()),
            title: Some("T".into()),
            content: Some("C".into()),
            ..Default::default()
        };
        let migrated = migrate(raw, true);
        assert!(is_canonical_id(&migrated.document.id));
        assert_eq!(
            migrated.document.legacy_id.as_deref(),
            Some("doc_1754900000000")
        );
        assert!(migrated.had_legacy_id);
    }

    #[test]
    fn migrate_fills_missing_fields_with_defaults() {
        let raw = RawDocument::default();
        let migrated = migrate(raw, true);
        assert_eq!(migrated.document.category, DEFAULT_CATEGORY);
        assert!(migrated.document.tags.is_empty());
        assert_eq!(migrated.document.version, 1);
        assert!(migrated.document.created_at <= migrated.document.updated_at);
    }
}
