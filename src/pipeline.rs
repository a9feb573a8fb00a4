//! # Research Pipeline Module
//!
//! Turns a keyword list into one [`ResearchResult`]:
//!
//! ```text
//! keywords ─┬─> search agent (per keyword, truncated) ──> search_results
//!           ├─> content ideas ──> LinkedIn posts      ──> content_ideas, linkedin_posts
//!           └─> news search + extraction (per keyword) ──> news_articles
//! ```
//!
//! The three branches run concurrently and per-keyword work is fanned out
//! through an ordered, bounded stream, so the output order always follows
//! the input keyword order. Every branch absorbs its own failures, which
//! makes [`ResearchPipeline::run`] infallible.

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::generator::{ContentGenerator, ContentIdeaSet, Generated, PostDraft};
use crate::llm::{GroqChatModel, LanguageModel};
use crate::news::{ArticleFetcher, HtmlArticleExtractor, NewsApiClient, NewsArticle};
use crate::search::{SearchAgent, SearchRecord};

/// Accepted values for the per-keyword result cap.
pub const MAX_RESULTS_RANGE: RangeInclusive<usize> = 1..=10;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

// =============================================================================
// INPUT
// =============================================================================
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InputError {
    #[error("Please enter at least one keyword")]
    NoKeywords,

    #[error("Maximum results must be between 1 and 10, got {0}")]
    MaxResultsOutOfRange(usize),
}

/// A validated research run: at least one keyword and a cap in range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchRequest {
    keywords: Vec<String>,
    max_results: usize,
}

impl ResearchRequest {
    /// Parse newline-separated keywords.
    ///
    /// Entries are trimmed; blank lines and repeats are dropped, keeping the
    /// first occurrence's position.
    pub fn parse(raw: &str, max_results: usize) -> Result<Self, InputError> {
        if !MAX_RESULTS_RANGE.contains(&max_results) {
            return Err(InputError::MaxResultsOutOfRange(max_results));
        }

        let mut seen = HashSet::new();
        let keywords: Vec<String> = raw
            .lines()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .filter(|k| seen.insert(k.to_string()))
            .map(str::to_string)
            .collect();

        if keywords.is_empty() {
            return Err(InputError::NoKeywords);
        }

        Ok(Self {
            keywords,
            max_results,
        })
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }
}

// =============================================================================
// OUTPUT
// =============================================================================
/// Everything one run produced, handed to the presentation layer by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchResult {
    pub search_results: Vec<SearchRecord>,
    pub content_ideas: Generated<ContentIdeaSet>,
    pub linkedin_posts: Generated<Vec<PostDraft>>,
    pub news_articles: Vec<NewsArticle>,
}

// =============================================================================
// PIPELINE
// =============================================================================
pub struct ResearchPipeline {
    search: SearchAgent,
    generator: ContentGenerator,
    fetcher: ArticleFetcher,
    concurrency: usize,
}

impl ResearchPipeline {
    pub fn new(
        search: SearchAgent,
        generator: ContentGenerator,
        fetcher: ArticleFetcher,
        concurrency: usize,
    ) -> Self {
        Self {
            search,
            generator,
            fetcher,
            concurrency: concurrency.max(1),
        }
    }

    /// Wire the production capabilities: Groq for the model, NewsAPI for
    /// news search and the HTML extractor for article text.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        let model: Arc<dyn LanguageModel> = Arc::new(GroqChatModel::new(config, http.clone()));

        let news = NewsApiClient::new(http.clone(), config.news_api_key.clone())
            .with_base_url(config.news_api_base_url.clone());
        let fetcher = ArticleFetcher::new(
            Arc::new(news),
            Arc::new(HtmlArticleExtractor::new(http)),
            config.max_concurrency,
        );

        Ok(Self::new(
            SearchAgent::new(model.clone()),
            ContentGenerator::new(model),
            fetcher,
            config.max_concurrency,
        ))
    }

    /// Run all research for one request.
    pub async fn run(&self, request: &ResearchRequest) -> ResearchResult {
        let keywords = request.keywords();
        info!(
            keywords = keywords.len(),
            max_results = request.max_results(),
            "Starting research"
        );

        let searches = self.search_all(keywords, request.max_results());

        let content = async {
            let ideas = self.generator.generate_ideas(keywords).await;
            let posts = self.generator.generate_posts(keywords, &ideas).await;
            (ideas, posts)
        };

        let articles = self.fetcher.fetch_news_articles(keywords);

        let (search_results, (content_ideas, linkedin_posts), news_articles) =
            tokio::join!(searches, content, articles);

        info!(
            search_results = search_results.len(),
            news_articles = news_articles.len(),
            "Research completed"
        );

        ResearchResult {
            search_results,
            content_ideas,
            linkedin_posts,
            news_articles,
        }
    }

    /// Search every keyword, keeping at most `max_results` records from each.
    async fn search_all(&self, keywords: &[String], max_results: usize) -> Vec<SearchRecord> {
        let per_keyword: Vec<Vec<SearchRecord>> = stream::iter(keywords)
            .map(|keyword| async move {
                let mut records = self.search.search(keyword).await;
                records.truncate(max_results);
                records
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        per_keyword.into_iter().flatten().collect()
    }
}
