//! C6: watches the on-disk document file and republishes filtered
//! snapshots. Grounded on `auto-sync-server.py`'s `CacheWatcher`, which
//! polls the cache file's mtime/hash and regenerates a frontend view on
//! change; here file-system events replace polling, via the `notify`
//! crate (the `notify`-based watchers in `kotadb-kota-db` and
//! `solisoft-solidb` are the pack's precedent for that substitution).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use notify::{RecursiveMode, Watcher as _};
use sha2::{Digest, Sha256};
use tokio::sync::watch;

use crate::error::WatchError;
use crate::predicate::ProjectionPredicate;
use crate::snapshot::Snapshot;

/// Holds the live `notify` watcher alive for as long as the background
/// task runs; dropping it tears down the OS-level watch.
pub struct Watcher {
    _inner: notify::RecommendedWatcher,
    pub receiver: watch::Receiver<Snapshot>,
}

/// Starts watching `documents_path`'s parent directory, publishing an
/// initial snapshot immediately and a fresh one on every debounced
/// content change thereafter.
pub fn spawn(
    documents_path: PathBuf,
    predicate: ProjectionPredicate,
    default_url: Option<String>,
    auto_migrate_ids: bool,
) -> Result<Watcher, WatchError> {
    let initial_bytes = std::fs::read(&documents_path).unwrap_or_default();
    let initial_hash = hash_bytes(&initial_bytes);
    let initial_snapshot = build_snapshot(&documents_path, &predicate, default_url.as_deref(), auto_migrate_ids, Utc::now());

    let (sender, receiver) = watch::channel(initial_snapshot);
    let last_hash = Arc::new(std::sync::Mutex::new(initial_hash));
    let last_sync_millis = Arc::new(AtomicU64::new(0));

    let watch_target = documents_path.clone();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut inner = notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
        let _ = tx.send(event);
    })?;

    let parent = documents_path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
    inner.watch(&parent, RecursiveMode::NonRecursive)?;

    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let event = match event {
                Ok(event) => event,
                Err(error) => {
                    tracing::warn!(%error, "watcher event error, continuing");
                    continue;
                }
            };
            if !event.paths.iter().any(|p| p == &watch_target) {
                continue;
            }

            let bytes = std::fs::read(&watch_target).unwrap_or_default();
            let hash = hash_bytes(&bytes);
            let mut guard = last_hash.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            if *guard == hash {
                tracing::debug!("debounced duplicate document-file event");
                continue;
            }
            *guard = hash;
            drop(guard);

            let monotonic_now = monotonic_timestamp(&last_sync_millis);
            let snapshot = build_snapshot(&watch_target, &predicate, default_url.as_deref(), auto_migrate_ids, monotonic_now);
            tracing::info!(total = snapshot.metadata.total, "publishing refreshed snapshot");
            if sender.send(snapshot).is_err() {
                tracing::warn!("no stream hub subscriber left, stopping watcher");
                break;
            }
        }
    });

    Ok(Watcher { _inner: inner, receiver })
}

fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}

/// Clamps `Utc::now()` to be strictly non-decreasing across calls, so
/// `lastSync` never regresses even if the system clock does.
fn monotonic_timestamp(last_sync_millis: &AtomicU64) -> chrono::DateTime<Utc> {
    let now_millis = Utc::now().timestamp_millis().max(0) as u64;
    let previous = last_sync_millis.fetch_max(now_millis, Ordering::SeqCst);
    let effective = now_millis.max(previous);
    chrono::DateTime::from_timestamp_millis(effective as i64).unwrap_or_else(Utc::now)
}

fn build_snapshot(
    documents_path: &Path,
    predicate: &ProjectionPredicate,
    default_url: Option<&str>,
    auto_migrate_ids: bool,
    last_sync: chrono::DateTime<Utc>,
) -> Snapshot {
    let documents = load_documents(documents_path, auto_migrate_ids);
    let source = documents_path.file_name().and_then(|n| n.to_str()).unwrap_or("documents.json");
    Snapshot::build(&documents, predicate, default_url, last_sync, source)
}

fn load_documents(path: &Path, auto_migrate_ids: bool) -> Vec<rag_core::Document> {
    match rag_store::document_file::try_read(path) {
        Ok(Some(stored)) => stored
            .documents
            .into_iter()
            .map(|raw| rag_store::document_file::migrate(raw, auto_migrate_ids).document)
            .collect(),
        Ok(None) => Vec::new(),
        Err(error) => {
            tracing::warn!(%error, "watcher failed to read document file, publishing empty snapshot");
            Vec::new()
        }
    }
}
