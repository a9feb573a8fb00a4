//! # Tools Module
//!
//! The `web_search` tool handed to the search agent. The language model
//! decides when to call it; the tool queries DuckDuckGo's HTML endpoint and
//! returns a markdown list of hits for the model to summarise.

use rig::completion::ToolDefinition;
use rig::tool::Tool;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Host of DuckDuckGo's JavaScript-free results page.
const DUCKDUCKGO_HTML_BASE_URL: &str = "https://html.duckduckgo.com";

// =============================================================================
// CUSTOM ERROR TYPE
// =============================================================================
/// Failures of a single DuckDuckGo query.
///
/// Rig requires a tool's error to implement `std::error::Error`; thiserror
/// derives it.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Failed to perform web search: {0}")]
    SearchFailed(String),

    #[error("Rate limited by search provider, please wait")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

// =============================================================================
// SEARCH HIT
// =============================================================================
/// One organic result scraped from the DuckDuckGo page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

// =============================================================================
// WEB SEARCH TOOL
// =============================================================================
/// DuckDuckGo search exposed to the agent as `web_search`.
///
/// Cloning is cheap: `reqwest::Client` is an `Arc` internally, so every
/// agent built from this tool shares one connection pool.
#[derive(Debug, Clone)]
pub struct WebSearchTool {
    client: reqwest::Client,
    base_url: String,
    max_results: usize,
}

impl WebSearchTool {
    /// Create a tool that returns at most `max_results` hits per query.
    pub fn new(client: reqwest::Client, max_results: usize) -> Self {
        Self {
            client,
            base_url: DUCKDUCKGO_HTML_BASE_URL.to_string(),
            max_results,
        }
    }

    /// Point the tool at another host (mirrors, mocks).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Run one DuckDuckGo query.
    pub async fn search(&self, query: &str) -> Result<Vec<WebHit>, SearchError> {
        info!(query = %query, "Performing web search");

        let url = format!("{}/html/?q={}", self.base_url, urlencoding::encode(query));
        debug!(url = %url, "Fetching search results");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(SearchError::RateLimited);
            }
            return Err(SearchError::SearchFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        let hits = parse_results(&body, self.max_results);

        if hits.is_empty() {
            warn!(query = %query, "No search results found");
        } else {
            info!(query = %query, count = hits.len(), "Search completed");
        }

        Ok(hits)
    }
}

/// Extract up to `limit` organic hits from a DuckDuckGo HTML page.
///
/// Ads and DuckDuckGo-internal links are skipped, and a URL is only
/// reported once.
fn parse_results(html: &str, limit: usize) -> Vec<WebHit> {
    let document = Html::parse_document(html);

    let (Ok(result_sel), Ok(link_sel), Ok(snippet_sel)) = (
        Selector::parse(".result"),
        Selector::parse("a.result__a"),
        Selector::parse(".result__snippet"),
    ) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut hits = Vec::new();

    for result in document.select(&result_sel) {
        if hits.len() >= limit {
            break;
        }

        let Some(link) = result.select(&link_sel).next() else {
            continue;
        };
        let Some(url) = link.value().attr("href").and_then(resolve_link) else {
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }

        let title = collapse_whitespace(&link.text().collect::<String>());
        let snippet = result
            .select(&snippet_sel)
            .next()
            .map(|s| collapse_whitespace(&s.text().collect::<String>()))
            .unwrap_or_default();

        hits.push(WebHit {
            title: if title.is_empty() {
                extract_domain(&url).unwrap_or_else(|| "Result".to_string())
            } else {
                title
            },
            url,
            snippet,
        });
    }

    hits
}

/// Turn a result href into the target URL.
///
/// DuckDuckGo wraps targets as `//duckduckgo.com/l/?uddg=<encoded>&rut=...`.
fn resolve_link(href: &str) -> Option<String> {
    let url = if let Some((_, rest)) = href.split_once("uddg=") {
        let encoded = rest.split('&').next().unwrap_or(rest);
        urlencoding::decode(encoded).ok()?.into_owned()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{}", rest)
    } else {
        href.to_string()
    };

    if url.starts_with("http") && !url.contains("duckduckgo.com") {
        Some(url)
    } else {
        None
    }
}

/// Extract the domain name from a URL.
fn extract_domain(url: &str) -> Option<String> {
    url.split("//")
        .nth(1)?
        .split('/')
        .next()
        .map(|s| s.to_string())
}

/// Collapse runs of whitespace (including newlines) into single spaces.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// =============================================================================
// RIG TOOL TRAIT IMPLEMENTATION
// =============================================================================
/// Input arguments for the search tool.
#[derive(Debug, Deserialize, Serialize)]
pub struct SearchArgs {
    /// The search query to execute
    pub query: String,
}

impl Tool for WebSearchTool {
    const NAME: &'static str = "web_search";

    type Args = SearchArgs;
    type Output = String;
    type Error = SearchError;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Search the web and news using DuckDuckGo. Returns titles, links and snippets.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query to find information and news about"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let hits = self.search(&args.query).await?;
        Ok(format_hits(&args.query, &hits))
    }
}

/// Markdown rendering of hits, as the model sees them.
fn format_hits(query: &str, hits: &[WebHit]) -> String {
    if hits.is_empty() {
        return format!("No results found for: {}", query);
    }

    let formatted: String = hits
        .iter()
        .enumerate()
        .map(|(i, h)| {
            format!(
                "{}. **{}**\n   URL: {}\n   {}\n",
                i + 1,
                h.title,
                h.url,
                h.snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("## Search Results for: {}\n\n{}", query, formatted)
}

// =============================================================================
// UNIT TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r##"
        <html><body>
          <div class="result results_links result--ad">
            <a class="result__a" href="https://duckduckgo.com/y.js?ad_provider=x">Sponsored</a>
          </div>
          <div class="result results_links">
            <h2><a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F&amp;rut=abc">
              Rust   Programming Language</a></h2>
            <a class="result__snippet" href="#">A language empowering
              everyone.</a>
          </div>
          <div class="result results_links">
            <a class="result__a" href="//blog.rust-lang.org/2024/">Rust Blog</a>
            <div class="result__snippet">Release notes</div>
          </div>
          <div class="result results_links">
            <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F">Duplicate</a>
          </div>
        </body></html>
    "##;

    #[test]
    fn test_parse_results_skips_ads_and_duplicates() {
        let hits = parse_results(RESULTS_PAGE, 10);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://www.rust-lang.org/");
        assert_eq!(hits[0].title, "Rust Programming Language");
        assert_eq!(hits[0].snippet, "A language empowering everyone.");
        assert_eq!(hits[1].url, "https://blog.rust-lang.org/2024/");
        assert_eq!(hits[1].snippet, "Release notes");
    }

    #[test]
    fn test_parse_results_respects_limit() {
        let hits = parse_results(RESULTS_PAGE, 1);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_resolve_link() {
        assert_eq!(
            resolve_link("//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fa%3Fb%3D1&rut=x"),
            Some("https://example.com/a?b=1".to_string())
        );
        assert_eq!(
            resolve_link("https://example.com"),
            Some("https://example.com".to_string())
        );
        assert_eq!(resolve_link("/html/?q=next"), None);
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            extract_domain("https://www.example.com/page"),
            Some("www.example.com".to_string())
        );
    }

    #[test]
    fn test_format_hits() {
        assert_eq!(format_hits("nothing", &[]), "No results found for: nothing");

        let text = format_hits(
            "rust",
            &[WebHit {
                title: "Rust".to_string(),
                url: "https://rust-lang.org".to_string(),
                snippet: "Fast".to_string(),
            }],
        );
        assert!(text.starts_with("## Search Results for: rust"));
        assert!(text.contains("1. **Rust**"));
        assert!(text.contains("URL: https://rust-lang.org"));
    }

    // -------------------------------------------------------------------------
    // HTTP
    // -------------------------------------------------------------------------

    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn tool_answering(status: u16, body: &str) -> (MockServer, WebSearchTool) {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/html/"))
            .and(query_param("q", "rust async"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        let tool = WebSearchTool::new(reqwest::Client::new(), 5).with_base_url(mock_server.uri());
        (mock_server, tool)
    }

    #[tokio::test]
    async fn test_http_successful_search() {
        let (_server, tool) = tool_answering(200, RESULTS_PAGE).await;

        let hits = tool.search("rust async").await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://www.rust-lang.org/");
    }

    #[tokio::test]
    async fn test_http_rate_limited() {
        let (_server, tool) = tool_answering(429, "slow down").await;

        let err = tool.search("rust async").await.unwrap_err();
        assert!(matches!(err, SearchError::RateLimited));
    }

    #[tokio::test]
    async fn test_http_server_error() {
        let (_server, tool) = tool_answering(500, "oops").await;

        let err = tool.search("rust async").await.unwrap_err();
        assert!(matches!(err, SearchError::SearchFailed(ref msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn test_tool_call_returns_markdown() {
        let (_server, tool) = tool_answering(200, RESULTS_PAGE).await;

        let output = tool
            .call(SearchArgs {
                query: "rust async".to_string(),
            })
            .await
            .unwrap();

        assert!(output.starts_with("## Search Results for: rust async"));
        assert!(output.contains("1. **Rust Programming Language**"));
        assert!(output.contains("URL: https://blog.rust-lang.org/2024/"));
    }

    #[tokio::test]
    async fn test_tool_call_with_empty_page() {
        let (_server, tool) = tool_answering(200, "<html><body></body></html>").await;

        let output = tool
            .call(SearchArgs {
                query: "rust async".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(output, "No results found for: rust async");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
    }
}
