//! End-to-end dispatcher coverage: add → search → update → remove, run
//! against a real (embedder-less) engine backed by a temp cache dir.
//! Mirrors spec scenarios S1/S3 at the RPC-surface level.

use pretty_assertions::assert_eq;
use rag_rpc::{Dispatcher, EngineConfig, RagEngine};
use rag_search::{CascadeThresholds, DerivedIndices};
use rag_store::{DocumentStore, StoreOptions};
use serde_json::json;
use std::sync::Arc;

fn dispatcher(dir: &std::path::Path) -> Dispatcher {
    let options = StoreOptions {
        cache_dir: dir.to_path_buf(),
        dedup_enabled: true,
        versioning_enabled: true,
        auto_migrate_ids: true,
        auto_save: true,
        backup_retention: 1,
    };
    let store = DocumentStore::empty(options);
    let indices = DerivedIndices::build(&[], None, false, true, 1000).unwrap();
    let config = EngineConfig {
        cache_dir: dir.to_path_buf(),
        thresholds: CascadeThresholds { dense: 0.1, sparse: 0.0 },
        default_limit: 5,
    };
    Dispatcher::new(Arc::new(RagEngine::new(store, indices, None, config)))
}

#[tokio::test]
async fn add_then_search_finds_the_document() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher(dir.path());

    let add_result = dispatcher
        .call("add", json!({ "title": "Rust Guide", "content": "ownership borrowing lifetimes" }))
        .await
        .unwrap();
    assert_eq!(add_result["deduplicated"], json!(false));

    let search_result = dispatcher.call("search", json!({ "query": "ownership" })).await.unwrap();
    let results = search_result["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["document"]["title"], json!("Rust Guide"));
    assert_eq!(search_result["query"], json!("ownership"));
    assert_eq!(search_result["total"], json!(1));
}

#[tokio::test]
async fn add_dedup_unions_tags_without_duplicating_row() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher(dir.path());

    dispatcher
        .call("add", json!({ "title": "A", "content": "same text", "tags": ["one"] }))
        .await
        .unwrap();
    let second = dispatcher
        .call("add", json!({ "title": "A again", "content": "same text", "tags": ["two"] }))
        .await
        .unwrap();
    assert_eq!(second["deduplicated"], json!(true));

    let list_result = dispatcher.call("list", json!(null)).await.unwrap();
    assert_eq!(list_result["total"], json!(1));
}

#[tokio::test]
async fn remove_drops_the_document() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher(dir.path());

    let added = dispatcher.call("add", json!({ "title": "T", "content": "C" })).await.unwrap();
    let id = added["document"]["id"].as_str().unwrap().to_string();

    let removed = dispatcher.call("remove", json!({ "id": id })).await.unwrap();
    assert_eq!(removed["removed"], json!(true));

    let stats = dispatcher.call("stats", json!(null)).await.unwrap();
    assert_eq!(stats["total_documents"], json!(0));
}

#[tokio::test]
async fn stats_reports_index_availability_and_server_version() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher(dir.path());

    let stats = dispatcher.call("stats", json!(null)).await.unwrap();
    assert_eq!(stats["has_dense_index"], json!(false));
    assert_eq!(stats["has_sparse_index"], json!(true));
    assert_eq!(stats["server_version"], json!(env!("CARGO_PKG_VERSION")));
}

#[tokio::test]
async fn unknown_tool_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher(dir.path());
    let error = dispatcher.call("not_a_tool", json!(null)).await.unwrap_err();
    assert_eq!(error.code(), rag_rpc::error::METHOD_NOT_FOUND);
}

#[tokio::test]
async fn missing_required_field_is_invalid_params() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher(dir.path());
    let error = dispatcher.call("remove", json!({})).await.unwrap_err();
    assert_eq!(error.code(), rag_rpc::error::INVALID_PARAMS);
}
