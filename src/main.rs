//! # Keyword Research Agent
//!
//! Give it a few keywords and it will:
//! - search the web for each keyword through a Groq-hosted agent with a
//!   DuckDuckGo tool
//! - draft five content ideas for the whole keyword set
//! - turn those ideas into five LinkedIn posts
//! - pull popular news articles for each keyword and extract their text
//!
//! ## Quick Start
//! ```bash
//! export GROQ_API_KEY=... NEWS_API_KEY=...
//! cargo run -- "rust programming" "webassembly" --max-results 3
//! ```

// =============================================================================
// MODULE DECLARATIONS
// =============================================================================

/// Configuration management
mod config;

/// Content ideas and LinkedIn posts
mod generator;

/// Language model capability (Groq via Rig)
mod llm;

/// News search and article extraction
mod news;

/// Orchestration of one research run
mod pipeline;

/// Terminal and JSON output
mod report;

/// Search agent adapter
mod search;

/// Web search tool for the agent
mod tools;

#[cfg(test)]
mod testing;

// =============================================================================
// IMPORTS
// =============================================================================
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;
use crate::pipeline::{ResearchPipeline, ResearchRequest};

// =============================================================================
// CLI ARGUMENTS
// =============================================================================
#[derive(Parser, Debug)]
#[command(
    name = "keyword-research-agent",
    version,
    about = "Search the web and news for keywords, then draft content ideas and LinkedIn posts",
    long_about = r#"
Keyword Research Agent

For every keyword it searches the web (Groq + DuckDuckGo) and fetches popular
news articles (NewsAPI). For the keyword set as a whole it drafts five content
ideas and five LinkedIn posts.

REQUIRED ENVIRONMENT (or .env):
  GROQ_API_KEY   Groq API key
  NEWS_API_KEY   NewsAPI key

EXAMPLES:
  keyword-research-agent "rust programming" "webassembly"
  keyword-research-agent --input keywords.txt --max-results 3
  printf 'rust\ntokio\n' | keyword-research-agent --input - --json
"#
)]
struct Args {
    /// Keywords to research (one per argument)
    #[arg(value_name = "KEYWORD")]
    keywords: Vec<String>,

    /// Read additional newline-separated keywords from a file ("-" for stdin)
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    input: Option<PathBuf>,

    /// Maximum search results kept per keyword
    #[arg(
        short = 'n',
        long = "max-results",
        default_value_t = 5,
        value_parser = clap::value_parser!(u8).range(1..=10)
    )]
    max_results: u8,

    /// Groq model to use (overrides GROQ_MODEL)
    #[arg(short = 'm', long = "model", env = "GROQ_MODEL")]
    model: Option<String>,

    /// Keywords processed at the same time (overrides MAX_CONCURRENCY)
    #[arg(short = 'c', long = "concurrency")]
    concurrency: Option<usize>,

    /// Print the result as JSON instead of a text report
    #[arg(long = "json", default_value = "false")]
    json: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long = "verbose", default_value = "false")]
    verbose: bool,
}

impl Args {
    /// All keyword input as newline-separated text.
    fn keyword_text(&self) -> Result<String> {
        let mut lines = self.keywords.clone();

        if let Some(path) = &self.input {
            let text = if path.as_os_str() == "-" {
                std::io::read_to_string(std::io::stdin()).context("Failed to read keywords from stdin")?
            } else {
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read keywords from {}", path.display()))?
            };
            lines.push(text);
        }

        Ok(lines.join("\n"))
    }

    /// The validated research request. Input errors are returned, not
    /// printed; `main` reports them once on exit.
    fn request(&self) -> Result<ResearchRequest> {
        let text = self.keyword_text()?;
        Ok(ResearchRequest::parse(&text, usize::from(self.max_results))?)
    }
}

// =============================================================================
// MAIN FUNCTION
// =============================================================================
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose)?;

    info!("Keyword research agent starting up...");

    // Missing credentials stop us here, before any input is looked at.
    let mut config = Config::from_env()?;

    if let Some(model) = &args.model {
        info!(model = %model, "Using model from command line");
        config.model = model.clone();
    }

    if let Some(concurrency) = args.concurrency {
        config.max_concurrency = concurrency;
    }

    config.validate()?;

    info!(
        model = %config.model,
        concurrency = config.max_concurrency,
        timeout_secs = config.request_timeout_secs,
        "Configuration loaded"
    );

    let request = args.request()?;

    let pipeline = ResearchPipeline::from_config(&config)?;
    let result = pipeline.run(&request).await;

    if args.json {
        println!("{}", report::render_json(&result)?);
    } else {
        print!("{}", report::render_text(&result));
    }

    info!("Research completed successfully");
    Ok(())
}

// =============================================================================
// LOGGING INITIALIZATION
// =============================================================================
/// Install the global tracing subscriber.
///
/// Logs go to stderr so stdout carries only the report.
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}
