//! # Language Model Module
//!
//! The `LanguageModel` capability used by the search agent and both content
//! generators, plus its Groq implementation built on Rig.
//!
//! Providers do not promise a reply shape. A reply may be plain prose, a
//! JSON object or a JSON array (often wrapped in a markdown code fence), so
//! the capability hands back a `serde_json::Value` and leaves the
//! interpretation to the caller:
//! - `Value::String` is the plain-text shape
//! - `Value::Object` / `Value::Array` are the structured shapes

use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::groq;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::tools::WebSearchTool;

/// Upper bound on tool round-trips for a tool-enabled call.
const MAX_TOOL_TURNS: usize = 5;

/// Hits the `web_search` tool returns per query.
const TOOL_MAX_RESULTS: usize = 10;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Agent execution failed: {0}")]
    Agent(String),

    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),
}

// =============================================================================
// CAPABILITY TRAIT
// =============================================================================
/// "Send a prompt, receive text or structured content."
///
/// # Rust Concept: Trait Objects
///
/// The pipeline stores `Arc<dyn LanguageModel>`, so tests can swap the
/// Groq client for a scripted fake. `async_trait` makes the async method
/// object-safe.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Run one stateless exchange.
    ///
    /// `preamble` is the system prompt; with `tools_enabled` the model may
    /// call the web search tool before answering.
    async fn chat(&self, preamble: &str, prompt: &str, tools_enabled: bool)
        -> Result<Value, LlmError>;
}

// =============================================================================
// GROQ IMPLEMENTATION
// =============================================================================
/// Groq-hosted chat model with an optional DuckDuckGo tool.
///
/// Every call builds a fresh Rig agent, so no conversation state leaks
/// between keywords and one instance can serve concurrent calls.
pub struct GroqChatModel {
    client: groq::Client,
    model: String,
    temperature: f64,
    timeout: Duration,
    web_search: WebSearchTool,
}

impl GroqChatModel {
    /// Build the model from validated configuration.
    ///
    /// `http` is the shared HTTP client the web search tool reuses.
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        let client = groq::Client::from_val(config.groq_api_key.clone().into());

        Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
            timeout: config.request_timeout(),
            web_search: WebSearchTool::new(http, TOOL_MAX_RESULTS),
        }
    }
}

#[async_trait]
impl LanguageModel for GroqChatModel {
    async fn chat(
        &self,
        preamble: &str,
        prompt: &str,
        tools_enabled: bool,
    ) -> Result<Value, LlmError> {
        debug!(model = %self.model, tools_enabled, "Dispatching prompt");

        let call = async {
            if tools_enabled {
                let agent = self
                    .client
                    .agent(&self.model)
                    .preamble(preamble)
                    .temperature(self.temperature)
                    .tool(self.web_search.clone())
                    .build();
                agent.prompt(prompt).multi_turn(MAX_TOOL_TURNS).await
            } else {
                let agent = self
                    .client
                    .agent(&self.model)
                    .preamble(preamble)
                    .temperature(self.temperature)
                    .build();
                agent.prompt(prompt).await
            }
        };

        let reply = bounded(self.timeout, call).await?;

        debug!(chars = reply.len(), "Model replied");
        Ok(parse_reply(&reply))
    }
}

/// Run a model call under `timeout`, mapping expiry and call errors to
/// [`LlmError`].
pub(crate) async fn bounded<F, T, E>(timeout: Duration, call: F) -> Result<T, LlmError>
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| LlmError::Timeout(timeout))?
        .map_err(|e| LlmError::Agent(e.to_string()))
}

// =============================================================================
// REPLY INTERPRETATION
// =============================================================================
/// Interpret a raw reply as a payload.
///
/// A reply that is (or is fenced around) a JSON object or array becomes that
/// value. Prose inside an untagged or `markdown` fence is unwrapped; anything
/// else is kept verbatim as `Value::String`.
pub fn parse_reply(raw: &str) -> Value {
    let trimmed = raw.trim();

    let Some(fence) = strip_code_fence(trimmed) else {
        return match serde_json::from_str::<Value>(trimmed) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => value,
            _ => Value::String(trimmed.to_string()),
        };
    };

    match serde_json::from_str::<Value>(fence.body) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => value,
        _ if matches!(fence.tag, "" | "markdown" | "md") => Value::String(fence.body.to_string()),
        _ => Value::String(trimmed.to_string()),
    }
}

struct Fence<'a> {
    tag: &'a str,
    body: &'a str,
}

/// Split a ```` ```lang ... ``` ```` block spanning the whole text.
fn strip_code_fence(text: &str) -> Option<Fence<'_>> {
    let inner = text.strip_prefix("```")?.strip_suffix("```")?;

    // The opening line may carry a language tag such as `json`.
    let (tag, body) = match inner.split_once('\n') {
        Some((tag, rest)) if !tag.trim().contains(char::is_whitespace) => (tag.trim(), rest),
        _ => ("", inner),
    };

    Some(Fence {
        tag,
        body: body.trim(),
    })
}

/// Text form of a payload, for consumers that only want prose.
pub fn payload_text(payload: &Value) -> String {
    match payload {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}
