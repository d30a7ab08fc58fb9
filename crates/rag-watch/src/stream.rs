//! C7: the Stream Hub. Accepts long-lived WebSocket connections, sends an
//! `initial` frame on connect, and fans out `sync` frames as the Watcher
//! publishes new snapshots. No literal teacher precedent for this piece —
//! grounded on the axum `ws` feature used for long-lived connections in
//! `econic-ai-massive-graph` and `xcorat-araliya-bot`.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use crate::snapshot::Snapshot;

const CLIENT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct StreamHub {
    snapshots: watch::Receiver<Snapshot>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum OutgoingFrame<'a> {
    Initial { data: &'a Snapshot, timestamp: chrono::DateTime<Utc> },
    Sync { data: &'a Snapshot, timestamp: chrono::DateTime<Utc> },
    Pong { timestamp: chrono::DateTime<Utc> },
}

impl StreamHub {
    #[must_use]
    pub fn new(snapshots: watch::Receiver<Snapshot>) -> Self {
        Self { snapshots }
    }

    #[must_use]
    pub fn router(self) -> Router {
        Router::new()
            .route("/stream", get(upgrade))
            .layer(TraceLayer::new_for_http())
            .with_state(self)
    }
}

async fn upgrade(State(hub): State<StreamHub>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, hub))
}

/// One client's lifetime. Each connection is an independent cooperative
/// task; a slow or dead client never blocks the broadcast to others,
/// since every connection reads from its own cloned `watch::Receiver`.
async fn handle_connection(mut socket: WebSocket, hub: StreamHub) {
    let mut snapshots = hub.snapshots;

    let initial = snapshots.borrow().clone();
    if send_frame(&mut socket, &OutgoingFrame::Initial { data: &initial, timestamp: Utc::now() }).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if send_frame(&mut socket, &OutgoingFrame::Sync { data: &snapshot, timestamp: Utc::now() }).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if !handle_client_message(&mut socket, &text, &snapshots).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        tracing::debug!(%error, "stream client read error, disconnecting");
                        break;
                    }
                }
            }
        }
    }
}

/// Handles one client-originated text frame. Returns `false` if the
/// connection should be torn down.
async fn handle_client_message(socket: &mut WebSocket, text: &str, snapshots: &watch::Receiver<Snapshot>) -> bool {
    let Ok(parsed) = serde_json::from_str::<Value>(text) else {
        return true;
    };
    match parsed.get("type").and_then(Value::as_str) {
        Some("ping") => send_frame(socket, &OutgoingFrame::Pong { timestamp: Utc::now() }).await.is_ok(),
        Some("request_sync") => {
            let snapshot = snapshots.borrow().clone();
            send_frame(socket, &OutgoingFrame::Sync { data: &snapshot, timestamp: Utc::now() }).await.is_ok()
        }
        _ => true,
    }
}

/// Writes one JSON text frame, bounded by [`CLIENT_WRITE_TIMEOUT`]; a
/// client that cannot accept the write within that bound is treated as
/// failed and disconnected.
async fn send_frame<T: Serialize>(socket: &mut WebSocket, frame: &T) -> Result<(), ()> {
    let Ok(text) = serde_json::to_string(frame) else {
        return Err(());
    };
    match tokio::time::timeout(CLIENT_WRITE_TIMEOUT, socket.send(Message::Text(text.into()))).await {
        Ok(Ok(())) => Ok(()),
        _ => Err(()),
    }
}
