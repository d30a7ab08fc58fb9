//! # rag-watch
//!
//! The document-file watcher and frontend projector (C6), and the
//! WebSocket stream hub that fans out its snapshots (C7).

pub mod error;
pub mod predicate;
pub mod projection;
pub mod snapshot;
pub mod stream;
pub mod watcher;

pub use error::WatchError;
pub use predicate::ProjectionPredicate;
pub use snapshot::Snapshot;
pub use stream::StreamHub;
pub use watcher::{spawn, Watcher};
