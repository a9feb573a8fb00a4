//! # Search Agent Module
//!
//! Wraps one tool-enabled model call per keyword and normalizes whatever the
//! model answers with into a flat list of [`SearchRecord`]s.
//!
//! The reply shape is decoded with fixed precedence:
//! 1. plain text → one record carrying the text as its snippet
//! 2. an object with a `results` array → one record per item
//! 3. an array → one record per item
//! 4. anything else → one record carrying the serialized value

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::llm::LanguageModel;

/// Title used when the whole reply becomes a single record.
pub const PLACEHOLDER_TITLE: &str = "Search Result";

/// Title used when a structured item has no title.
pub const MISSING_TITLE: &str = "No title";

const SEARCH_AGENT_PREAMBLE: &str = r#"
You are a search agent that helps users find information and news using DuckDuckGo.

- Use the web_search tool to find current information.
- When searching, return results in a structured format.
- Each result should include a title, link, and snippet.
- Focus on providing accurate and relevant information.
- If possible, return results as a JSON list of objects with the keys "title", "link" and "snippet".
"#;

// =============================================================================
// DATA TYPES
// =============================================================================
/// One normalized search hit. All three fields are always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub title: String,
    /// May be empty when the source gave no link
    pub link: String,
    pub snippet: String,
}

/// The shapes a search reply is discriminated into.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPayload {
    /// Free-form prose
    Text(String),
    /// Items from a top-level array or from an object's `results` array
    ResultList(Vec<Value>),
    /// Any other value
    Other(Value),
}

impl SearchPayload {
    /// Discriminate a raw payload.
    pub fn decode(payload: Value) -> Self {
        match payload {
            Value::String(text) => SearchPayload::Text(text),
            Value::Object(map) => match map.get("results") {
                Some(Value::Array(items)) => SearchPayload::ResultList(items.clone()),
                _ => SearchPayload::Other(Value::Object(map)),
            },
            Value::Array(items) => SearchPayload::ResultList(items),
            other => SearchPayload::Other(other),
        }
    }

    /// Flatten into records, filling defaults for missing fields.
    pub fn into_records(self) -> Vec<SearchRecord> {
        match self {
            SearchPayload::Text(text) => vec![SearchRecord {
                title: PLACEHOLDER_TITLE.to_string(),
                link: String::new(),
                snippet: text,
            }],
            SearchPayload::ResultList(items) => items.iter().map(record_from_item).collect(),
            SearchPayload::Other(value) => vec![SearchRecord {
                title: PLACEHOLDER_TITLE.to_string(),
                link: String::new(),
                snippet: value.to_string(),
            }],
        }
    }
}

fn record_from_item(item: &Value) -> SearchRecord {
    match item {
        Value::Object(fields) => SearchRecord {
            title: field_text(fields, "title").unwrap_or_else(|| MISSING_TITLE.to_string()),
            link: field_text(fields, "link")
                .or_else(|| field_text(fields, "url"))
                .unwrap_or_default(),
            snippet: field_text(fields, "snippet").unwrap_or_default(),
        },
        Value::String(text) => SearchRecord {
            title: MISSING_TITLE.to_string(),
            link: String::new(),
            snippet: text.clone(),
        },
        other => SearchRecord {
            title: MISSING_TITLE.to_string(),
            link: String::new(),
            snippet: other.to_string(),
        },
    }
}

/// A field as text; `null` counts as missing.
fn field_text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

// =============================================================================
// SEARCH AGENT
// =============================================================================
/// Reusable search agent handle.
///
/// Holds no per-call state, so one handle is shared by every concurrent
/// keyword search.
#[derive(Clone)]
pub struct SearchAgent {
    model: Arc<dyn LanguageModel>,
}

impl SearchAgent {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Search one keyword.
    ///
    /// Never fails: a model or transport error is logged as a warning and
    /// yields an empty list, so one bad keyword does not sink the batch.
    pub async fn search(&self, keyword: &str) -> Vec<SearchRecord> {
        info!(keyword = %keyword, "Searching for keyword");

        let prompt = format!("Find detailed information and news about: {}", keyword);

        match self.model.chat(SEARCH_AGENT_PREAMBLE, &prompt, true).await {
            Ok(payload) => {
                let records = SearchPayload::decode(payload).into_records();
                info!(keyword = %keyword, count = records.len(), "Search completed");
                records
            }
            Err(e) => {
                warn!(keyword = %keyword, error = %e, "Search failed");
                Vec::new()
            }
        }
    }
}
