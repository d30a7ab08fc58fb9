//! End-to-end coverage of the watcher → stream hub path: a client
//! connects, receives an `initial` frame reflecting the current
//! predicate-filtered snapshot, then a document-file change that
//! matches the predicate produces a `sync` frame with an incremented
//! total. Mirrors spec scenario S6.

use std::collections::BTreeSet;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rag_store::{DocumentStore, StoreOptions};
use rag_watch::ProjectionPredicate;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

fn store_options(dir: &std::path::Path) -> StoreOptions {
    StoreOptions {
        cache_dir: dir.to_path_buf(),
        dedup_enabled: true,
        versioning_enabled: true,
        auto_migrate_ids: true,
        auto_save: true,
        backup_retention: 1,
    }
}

#[tokio::test]
async fn initial_frame_then_sync_on_matching_add() {
    let dir = tempfile::tempdir().unwrap();
    let options = store_options(dir.path());
    let documents_path = options.documents_path();
    let mut store = DocumentStore::empty(options);
    store.save().unwrap();

    let watcher = rag_watch::spawn(documents_path, ProjectionPredicate::a2a_default(), None, true).unwrap();
    let hub = rag_watch::StreamHub::new(watcher.receiver.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, hub.router()).await.unwrap();
    });

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/stream")).await.unwrap();

    let initial = next_json(&mut socket).await;
    assert_eq!(initial["type"], "initial");
    assert_eq!(initial["data"]["metadata"]["total"], 0);

    let mut tags = BTreeSet::new();
    tags.insert("a2a".to_string());
    store
        .add("A2A doc".into(), "Fonte: https://a2aprotocol.example/doc\nbody".into(), rag_core::DocumentType::Text, None, None, tags)
        .unwrap();

    let sync = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let frame = next_json(&mut socket).await;
            if frame["type"] == "sync" {
                return frame;
            }
        }
    })
    .await
    .expect("sync frame did not arrive in time");

    assert_eq!(sync["data"]["metadata"]["total"], 1);
    assert_eq!(sync["data"]["documents"][0]["title"], "A2A doc");

    drop(watcher);
}

#[tokio::test]
async fn ping_is_answered_with_pong() {
    let dir = tempfile::tempdir().unwrap();
    let options = store_options(dir.path());
    let documents_path = options.documents_path();
    let store = DocumentStore::empty(options);
    store.save().unwrap();

    let watcher = rag_watch::spawn(documents_path, ProjectionPredicate::a2a_default(), None, true).unwrap();
    let hub = rag_watch::StreamHub::new(watcher.receiver.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, hub.router()).await.unwrap();
    });

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/stream")).await.unwrap();
    let _initial = next_json(&mut socket).await;

    socket.send(Message::Text(serde_json::json!({ "type": "ping" }).to_string().into())).await.unwrap();
    let pong = next_json(&mut socket).await;
    assert_eq!(pong["type"], "pong");

    drop(watcher);
}

async fn next_json(socket: &mut tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>) -> serde_json::Value {
    loop {
        match socket.next().await.expect("stream ended").unwrap() {
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            _ => continue,
        }
    }
}
