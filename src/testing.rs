//! Scripted stand-ins for the external capabilities, shared by unit tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::llm::{LanguageModel, LlmError};
use crate::news::{ArticleExtractor, ExtractError, NewsArticle, NewsCandidate, NewsError, NewsSearch};

type Responder = Box<dyn Fn(&str, bool) -> Result<Value, LlmError> + Send + Sync>;
type Delayer = Box<dyn Fn(&str) -> Duration + Send + Sync>;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub preamble: String,
    pub prompt: String,
    pub tools_enabled: bool,
}

/// A model whose reply is computed from the prompt.
pub struct ScriptedModel {
    responder: Responder,
    delay: Option<Delayer>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedModel {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str, bool) -> Result<Value, LlmError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Sleep before answering, based on the prompt.
    pub fn with_delay<F>(mut self, delay: F) -> Self
    where
        F: Fn(&str) -> Duration + Send + Sync + 'static,
    {
        self.delay = Some(Box::new(delay));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn chat(
        &self,
        preamble: &str,
        prompt: &str,
        tools_enabled: bool,
    ) -> Result<Value, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            preamble: preamble.to_string(),
            prompt: prompt.to_string(),
            tools_enabled,
        });

        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(prompt)).await;
        }

        (self.responder)(prompt, tools_enabled)
    }
}

/// Canned news search results per keyword. Unknown keywords return nothing.
#[derive(Default)]
pub struct FakeNews {
    results: HashMap<String, Result<Vec<NewsCandidate>, u16>>,
}

impl FakeNews {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keyword(mut self, keyword: &str, candidates: Vec<NewsCandidate>) -> Self {
        self.results.insert(keyword.to_string(), Ok(candidates));
        self
    }

    pub fn with_status(mut self, keyword: &str, status: u16) -> Self {
        self.results.insert(keyword.to_string(), Err(status));
        self
    }
}

#[async_trait]
impl NewsSearch for FakeNews {
    async fn search(&self, keyword: &str) -> Result<Vec<NewsCandidate>, NewsError> {
        match self.results.get(keyword) {
            Some(Ok(candidates)) => Ok(candidates.clone()),
            Some(Err(status)) => Err(NewsError::Status {
                status: *status,
                body: String::new(),
            }),
            None => Ok(Vec::new()),
        }
    }
}

/// Canned extraction outcomes per URL. Unknown URLs fail.
///
/// Tracks how many extractions overlapped at most.
#[derive(Default)]
pub struct FakeExtractor {
    articles: HashMap<String, NewsArticle>,
    delays: HashMap<String, Duration>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_article(mut self, url: &str, article: NewsArticle) -> Self {
        self.articles.insert(url.to_string(), article);
        self
    }

    pub fn with_failure(mut self, url: &str) -> Self {
        self.articles.remove(url);
        self
    }

    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArticleExtractor for FakeExtractor {
    async fn extract(&self, url: &str) -> Result<NewsArticle, ExtractError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.articles.get(url).cloned().ok_or(ExtractError::NoContent)
    }
}
