//! # News Module
//!
//! Finds popular news articles for a keyword and resolves each one to its
//! full text.
//!
//! Two capabilities sit behind traits so the fetcher can be exercised with
//! fakes:
//! - [`NewsSearch`]: keyword → candidate articles (NewsAPI `/v2/everything`)
//! - [`ArticleExtractor`]: article URL → title and body text (HTML scraping)
//!
//! Failures are expected and local. A non-success news search yields no
//! articles for that keyword; a candidate that cannot be downloaded or
//! parsed is skipped. Neither stops the batch.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::tools::collapse_whitespace;

/// Articles requested from NewsAPI per keyword.
const PAGE_SIZE: u32 = 5;

// =============================================================================
// ERROR TYPES
// =============================================================================
#[derive(Error, Debug)]
pub enum NewsError {
    #[error("News API request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("News API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse news API response: {0}")]
    Parse(String),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Download failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Article page returned HTTP {0}")]
    Status(u16),

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("No article text found")]
    NoContent,
}

// =============================================================================
// DATA TYPES
// =============================================================================
/// A search hit from the news API. Only the URL is needed downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsCandidate {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// A successfully extracted article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<NewsCandidate>,
}

// =============================================================================
// CAPABILITY TRAITS
// =============================================================================
#[async_trait]
pub trait NewsSearch: Send + Sync {
    /// Candidate articles for one keyword, in the provider's order.
    async fn search(&self, keyword: &str) -> Result<Vec<NewsCandidate>, NewsError>;
}

#[async_trait]
pub trait ArticleExtractor: Send + Sync {
    /// Download and parse one article. The title may come back empty.
    async fn extract(&self, url: &str) -> Result<NewsArticle, ExtractError>;
}

// =============================================================================
// NEWSAPI CLIENT
// =============================================================================
/// NewsAPI `/v2/everything`, sorted by popularity, English only.
pub struct NewsApiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl NewsApiClient {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: crate::config::DEFAULT_NEWS_API_BASE_URL.to_string(),
        }
    }

    /// Point the client at another host (staging, mocks).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl NewsSearch for NewsApiClient {
    async fn search(&self, keyword: &str) -> Result<Vec<NewsCandidate>, NewsError> {
        let url = format!("{}/v2/everything", self.base_url);
        let page_size = PAGE_SIZE.to_string();

        debug!(keyword = %keyword, "Querying news API");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", keyword),
                ("sortBy", "popularity"),
                ("apiKey", self.api_key.as_str()),
                ("language", "en"),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NewsError::Timeout
                } else {
                    NewsError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NewsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EverythingResponse = response
            .json()
            .await
            .map_err(|e| NewsError::Parse(e.to_string()))?;

        Ok(parsed.articles)
    }
}

// =============================================================================
// HTML ARTICLE EXTRACTOR
// =============================================================================
/// Downloads a page and pulls out its headline and paragraph text.
pub struct HtmlArticleExtractor {
    client: reqwest::Client,
}

impl HtmlArticleExtractor {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ArticleExtractor for HtmlArticleExtractor {
    async fn extract(&self, url: &str) -> Result<NewsArticle, ExtractError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Status(status.as_u16()));
        }

        let html = response.text().await?;
        parse_article(&html)
    }
}

fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector(format!("{css}: {e}")))
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Extract title and body text from an article page.
///
/// Title: `og:title`, then `<title>`, then the first `<h1>`.
/// Body: paragraphs inside `<article>`, or every paragraph on the page when
/// there is no `<article>` element.
fn parse_article(html: &str) -> Result<NewsArticle, ExtractError> {
    let document = Html::parse_document(html);

    let og_title = selector(r#"meta[property="og:title"]"#)?;
    let title_tag = selector("title")?;
    let heading = selector("h1")?;

    let title = document
        .select(&og_title)
        .filter_map(|meta| meta.value().attr("content"))
        .map(collapse_whitespace)
        .find(|t| !t.is_empty())
        .or_else(|| {
            document
                .select(&title_tag)
                .chain(document.select(&heading))
                .map(element_text)
                .find(|t| !t.is_empty())
        })
        .unwrap_or_default();

    let article_paragraphs = selector("article p")?;
    let all_paragraphs = selector("p")?;

    let mut paragraphs: Vec<String> = document
        .select(&article_paragraphs)
        .map(element_text)
        .filter(|p| !p.is_empty())
        .collect();

    if paragraphs.is_empty() {
        paragraphs = document
            .select(&all_paragraphs)
            .map(element_text)
            .filter(|p| !p.is_empty())
            .collect();
    }

    if paragraphs.is_empty() {
        return Err(ExtractError::NoContent);
    }

    Ok(NewsArticle {
        title,
        content: paragraphs.join("\n\n"),
    })
}

// =============================================================================
// ARTICLE FETCHER
// =============================================================================
/// Keyword → full-text articles, tolerant of per-article failures.
///
/// Keywords and the candidates of each keyword are both fanned out
/// `concurrency` wide, but article downloads share one semaphore, so at most
/// `concurrency` extractions run at any moment across the whole batch.
#[derive(Clone)]
pub struct ArticleFetcher {
    news: Arc<dyn NewsSearch>,
    extractor: Arc<dyn ArticleExtractor>,
    concurrency: usize,
    downloads: Arc<Semaphore>,
}

impl ArticleFetcher {
    pub fn new(
        news: Arc<dyn NewsSearch>,
        extractor: Arc<dyn ArticleExtractor>,
        concurrency: usize,
    ) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            news,
            extractor,
            concurrency,
            downloads: Arc::new(Semaphore::new(concurrency)),
        }
    }

    /// Articles for one keyword, in the news API's order.
    pub async fn fetch_articles(&self, keyword: &str) -> Vec<NewsArticle> {
        let candidates = match self.news.search(keyword).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(keyword = %keyword, error = %e, "Error fetching articles for keyword");
                return Vec::new();
            }
        };

        let total = candidates.len();

        // `buffered` yields in input order even when later downloads finish first.
        let articles: Vec<NewsArticle> = stream::iter(candidates)
            .map(|candidate| self.resolve(candidate))
            .buffered(self.concurrency)
            .filter_map(|article| async move { article })
            .collect()
            .await;

        info!(
            keyword = %keyword,
            candidates = total,
            articles = articles.len(),
            "Fetched news articles"
        );
        articles
    }

    /// Articles for every keyword, concatenated in keyword order.
    pub async fn fetch_news_articles(&self, keywords: &[String]) -> Vec<NewsArticle> {
        let per_keyword: Vec<Vec<NewsArticle>> = stream::iter(keywords)
            .map(|keyword| self.fetch_articles(keyword.trim()))
            .buffered(self.concurrency)
            .collect()
            .await;

        per_keyword.into_iter().flatten().collect()
    }

    async fn resolve(&self, candidate: NewsCandidate) -> Option<NewsArticle> {
        let Some(url) = candidate.url else {
            warn!("Error processing article: candidate has no URL");
            return None;
        };

        let extracted = {
            let Ok(_permit) = self.downloads.acquire().await else {
                return None;
            };
            self.extractor.extract(&url).await
        };

        match extracted {
            Ok(mut article) => {
                if article.title.is_empty() {
                    article.title = candidate.title.unwrap_or_default();
                }
                debug!(url = %url, "Extracted article");
                Some(article)
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Error processing article");
                None
            }
        }
    }
}
