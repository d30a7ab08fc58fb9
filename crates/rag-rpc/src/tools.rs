//! The eight named tool operations (C4): argument shapes, JSON Schemas
//! for `tools/list`, and the catalogue the dispatcher validates calls
//! against. Argument field names and defaults are grounded on the tool
//! blocks in `rag_server_v2.py`'s `handle_request` and the schema table
//! in `rag_server_enhanced.py`'s `create_tools_schema`.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

pub const TOOL_NAMES: [&str; 8] = [
    "search",
    "search_by_tags",
    "search_by_category",
    "add",
    "update",
    "remove",
    "list",
    "stats",
];

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchArgs {
    /// Free-text query. An empty or missing query yields no results.
    pub query: String,
    /// Maximum number of results. Defaults to the configured search limit.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Whether the dense (semantic) tier may run. Defaults to true.
    #[serde(default)]
    pub use_semantic: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchByTagsArgs {
    pub tags: Vec<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchByCategoryArgs {
    pub category: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddArgs {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateArgs {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RemoveArgs {
    pub id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListArgs {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct StatsArgs {}

/// A single entry in the `tools/list` response.
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

fn schema_of<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or_else(|_| serde_json::json!({}))
}

/// Builds the static catalogue `tools/list` returns.
#[must_use]
pub fn catalogue() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "search",
            description: "Cascading dense/sparse/substring search over the document store",
            input_schema: schema_of::<SearchArgs>(),
        },
        ToolDescriptor {
            name: "search_by_tags",
            description: "Find documents matching any of the given tags",
            input_schema: schema_of::<SearchByTagsArgs>(),
        },
        ToolDescriptor {
            name: "search_by_category",
            description: "Find documents in a given category",
            input_schema: schema_of::<SearchByCategoryArgs>(),
        },
        ToolDescriptor {
            name: "add",
            description: "Add a document, deduplicating by content hash",
            input_schema: schema_of::<AddArgs>(),
        },
        ToolDescriptor {
            name: "update",
            description: "Apply a partial update to an existing document",
            input_schema: schema_of::<UpdateArgs>(),
        },
        ToolDescriptor {
            name: "remove",
            description: "Remove a document by id",
            input_schema: schema_of::<RemoveArgs>(),
        },
        ToolDescriptor {
            name: "list",
            description: "List document summaries, optionally filtered",
            input_schema: schema_of::<ListArgs>(),
        },
        ToolDescriptor {
            name: "stats",
            description: "Return aggregate statistics about the store",
            input_schema: schema_of::<StatsArgs>(),
        },
    ]
}
