//! # rag-rpc
//!
//! The tool dispatcher (C4) and the line-delimited JSON-RPC 2.0 server
//! (C5) that exposes it over stdio.

pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod server;
pub mod tools;

#[cfg(test)]
mod tests_support;

pub use dispatcher::Dispatcher;
pub use engine::{EngineConfig, EngineStats, RagEngine, SharedEngine};
pub use error::DispatchError;
