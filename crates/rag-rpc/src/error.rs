//! RPC-layer error type, with the mapping onto JSON-RPC 2.0 error codes
//! from SPEC_FULL.md §7.

use thiserror::Error;

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    #[must_use]
    pub fn code(&self) -> i64 {
        match self {
            Self::UnknownTool(_) => METHOD_NOT_FOUND,
            Self::InvalidParams(_) => INVALID_PARAMS,
            Self::Internal(_) => INTERNAL_ERROR,
        }
    }
}

impl From<rag_store::RagStoreError> for DispatchError {
    fn from(e: rag_store::RagStoreError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<rag_search::SearchError> for DispatchError {
    fn from(e: rag_search::SearchError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<std::io::Error> for DispatchError {
    fn from(e: std::io::Error) -> Self {
        Self::Internal(e.to_string())
    }
}
