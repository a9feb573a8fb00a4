//! # Configuration Module
//!
//! Loads the research assistant's configuration from the environment
//! (optionally seeded from a `.env` file) and validates it before anything
//! talks to an external service.
//!
//! Both credentials are mandatory: a missing Groq or NewsAPI key aborts
//! startup instead of producing a half-working pipeline.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Default Groq-hosted model.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Default NewsAPI endpoint root.
pub const DEFAULT_NEWS_API_BASE_URL: &str = "https://newsapi.org";

// =============================================================================
// CONFIGURATION STRUCT
// =============================================================================
/// Process-wide settings, constructed once in `main` and handed to the
/// components that need them.
///
/// # Rust Concept: Explicit Context Objects
///
/// Instead of reading globals from deep inside the pipeline, every
/// component receives what it needs at construction time. Tests can then
/// build a `Config` by hand without touching the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Groq API key for the language model
    pub groq_api_key: String,

    /// NewsAPI key for the news search
    pub news_api_key: String,

    /// Groq model identifier
    pub model: String,

    /// Sampling temperature for every agent (0.0 ..= 2.0)
    pub temperature: f64,

    /// NewsAPI base URL (overridable for staging or mocks)
    pub news_api_base_url: String,

    /// Upper bound for any single external call, in seconds
    pub request_timeout_secs: u64,

    /// How many keywords are processed at the same time
    pub max_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            groq_api_key: String::new(),
            news_api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            news_api_base_url: DEFAULT_NEWS_API_BASE_URL.to_string(),
            request_timeout_secs: 60,
            max_concurrency: 4,
        }
    }
}

// =============================================================================
// CONFIGURATION LOADING
// =============================================================================
impl Config {
    /// Load configuration from the process environment, after applying `.env`.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is fine; real deployments set variables directly.
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// # Rust Concept: Closures as Parameters
    ///
    /// `impl Fn(&str) -> Option<String>` accepts any closure with that
    /// shape, so production passes `env::var` and tests pass a map lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(val) = lookup("GROQ_API_KEY") {
            config.groq_api_key = val.trim().to_string();
        }

        if let Some(val) = lookup("NEWS_API_KEY") {
            config.news_api_key = val.trim().to_string();
        }

        if let Some(val) = lookup("GROQ_MODEL") {
            config.model = val;
        }

        if let Some(val) = lookup("TEMPERATURE") {
            config.temperature = val
                .parse()
                .context("TEMPERATURE must be a valid floating-point number (e.g., 0.7)")?;
        }

        if let Some(val) = lookup("NEWS_API_BASE_URL") {
            config.news_api_base_url = val.trim_end_matches('/').to_string();
        }

        if let Some(val) = lookup("REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = val
                .parse()
                .context("REQUEST_TIMEOUT_SECS must be a positive integer")?;
        }

        if let Some(val) = lookup("MAX_CONCURRENCY") {
            config.max_concurrency = val
                .parse()
                .context("MAX_CONCURRENCY must be a positive integer")?;
        }

        Ok(config)
    }

    /// Validate the configuration. Any error here is fatal at startup.
    pub fn validate(&self) -> Result<()> {
        if self.groq_api_key.is_empty() {
            anyhow::bail!("Missing required GROQ_API_KEY. Please check your .env file.");
        }

        if self.news_api_key.is_empty() {
            anyhow::bail!("Missing required NEWS_API_KEY. Please check your .env file.");
        }

        if self.model.trim().is_empty() {
            anyhow::bail!("GROQ_MODEL cannot be empty");
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            anyhow::bail!(
                "Temperature must be between 0.0 and 2.0, got: {}",
                self.temperature
            );
        }

        if self.request_timeout_secs == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECS must be at least 1");
        }

        if self.max_concurrency == 0 {
            anyhow::bail!("MAX_CONCURRENCY must be at least 1");
        }

        Ok(())
    }

    /// Per-call timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
