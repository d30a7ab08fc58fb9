//! C4: the tool dispatcher. Validates `tools/call` arguments against the
//! eight named operations and turns engine results into the JSON shapes
//! the `rag_server_v2.py` tool handlers returned.

use std::collections::BTreeSet;
use std::str::FromStr;

use rag_core::{DocumentPatch, DocumentType};
use rag_store::ListFilter;
use serde_json::{json, Value};

use crate::engine::SharedEngine;
use crate::error::DispatchError;
use crate::tools::{self, AddArgs, ListArgs, RemoveArgs, SearchArgs, SearchByCategoryArgs, SearchByTagsArgs, StatsArgs, UpdateArgs};

pub struct Dispatcher {
    engine: SharedEngine,
}

impl Dispatcher {
    #[must_use]
    pub fn new(engine: SharedEngine) -> Self {
        Self { engine }
    }

    #[must_use]
    pub fn tool_catalogue(&self) -> Vec<tools::ToolDescriptor> {
        tools::catalogue()
    }

    pub async fn call(&self, name: &str, args: Value) -> Result<Value, DispatchError> {
        if !tools::TOOL_NAMES.contains(&name) {
            return Err(DispatchError::UnknownTool(name.to_string()));
        }
        match name {
            "search" => self.search(args).await,
            "search_by_tags" => self.search_by_tags(args).await,
            "search_by_category" => self.search_by_category(args).await,
            "add" => self.add(args).await,
            "update" => self.update(args).await,
            "remove" => self.remove(args).await,
            "list" => self.list(args).await,
            "stats" => self.stats(args).await,
            _ => unreachable!("checked against TOOL_NAMES above"),
        }
    }

    async fn search(&self, args: Value) -> Result<Value, DispatchError> {
        let args: SearchArgs = parse_args(args)?;
        if args.query.trim().is_empty() {
            return Err(DispatchError::InvalidParams("query must not be empty".into()));
        }
        let limit = args.limit.unwrap_or_else(|| self.engine.default_limit());
        let use_semantic = args.use_semantic.unwrap_or(true);
        let results = self.engine.search(&args.query, limit, use_semantic).await;
        let total = results.len();
        Ok(json!({ "results": results, "query": args.query, "total": total }))
    }

    async fn search_by_tags(&self, args: Value) -> Result<Value, DispatchError> {
        let args: SearchByTagsArgs = parse_args(args)?;
        if args.tags.is_empty() {
            return Err(DispatchError::InvalidParams("tags must not be empty".into()));
        }
        let limit = args.limit.unwrap_or_else(|| self.engine.default_limit());
        let results = self.engine.search_by_tags(&args.tags, limit).await;
        let total = results.len();
        Ok(json!({ "results": results, "tags": args.tags, "total": total }))
    }

    async fn search_by_category(&self, args: Value) -> Result<Value, DispatchError> {
        let args: SearchByCategoryArgs = parse_args(args)?;
        if args.category.trim().is_empty() {
            return Err(DispatchError::InvalidParams("category must not be empty".into()));
        }
        let limit = args.limit.unwrap_or_else(|| self.engine.default_limit());
        let results = self.engine.search_by_category(&args.category, limit).await;
        let total = results.len();
        Ok(json!({ "results": results, "category": args.category, "total": total }))
    }

    async fn add(&self, args: Value) -> Result<Value, DispatchError> {
        let args: AddArgs = parse_args(args)?;
        if args.title.trim().is_empty() || args.content.trim().is_empty() {
            return Err(DispatchError::InvalidParams("title and content must not be empty".into()));
        }
        let doc_type = args
            .doc_type
            .as_deref()
            .map(|s| DocumentType::from_str(s).expect("DocumentType::from_str is infallible"))
            .unwrap_or_default();
        let tags: BTreeSet<String> = args.tags.unwrap_or_default().into_iter().collect();
        let (doc, deduped) = self.engine.add(args.title, args.content, doc_type, args.source, args.category, tags).await?;
        Ok(json!({ "document": doc, "deduplicated": deduped }))
    }

    async fn update(&self, args: Value) -> Result<Value, DispatchError> {
        let args: UpdateArgs = parse_args(args)?;
        if args.id.trim().is_empty() {
            return Err(DispatchError::InvalidParams("id is required".into()));
        }
        let patch = DocumentPatch {
            title: args.title,
            content: args.content,
            tags: args.tags.map(|t| t.into_iter().collect()),
            category: args.category,
            metadata: args.metadata,
        };
        let updated = self.engine.update(&args.id, patch).await?;
        Ok(json!({ "updated": updated }))
    }

    async fn remove(&self, args: Value) -> Result<Value, DispatchError> {
        let args: RemoveArgs = parse_args(args)?;
        if args.id.trim().is_empty() {
            return Err(DispatchError::InvalidParams("id is required".into()));
        }
        let removed = self.engine.remove(&args.id).await?;
        Ok(json!({ "removed": removed }))
    }

    async fn list(&self, args: Value) -> Result<Value, DispatchError> {
        let args: ListArgs = parse_args(args)?;
        let filter = ListFilter {
            category: args.category,
            tags: args.tags.unwrap_or_default(),
            source: args.source,
        };
        let documents = self.engine.list(filter).await;
        let total = documents.len();
        Ok(json!({ "documents": documents, "total": total }))
    }

    async fn stats(&self, args: Value) -> Result<Value, DispatchError> {
        let _args: StatsArgs = parse_args(args)?;
        let stats = self.engine.stats().await;
        serde_json::to_value(stats).map_err(|e| DispatchError::Internal(e.to_string()))
    }
}

/// `null`/missing params are treated as an empty object, so tools with no
/// required fields (e.g. `stats`) can be called without a `params` key.
fn parse_args<T: serde::de::DeserializeOwned>(args: Value) -> Result<T, DispatchError> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| DispatchError::InvalidParams(e.to_string()))
}
