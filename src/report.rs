//! # Report Module
//!
//! Renders a [`ResearchResult`] for the terminal, one section per result
//! field, or as pretty JSON.

use std::fmt::Write;

use crate::generator::{Generated, PostLength, POST_CHAR_LIMIT};
use crate::pipeline::ResearchResult;
use crate::search::MISSING_TITLE;

const RULE_WIDTH: usize = 60;

/// Plain-text report with Search Results, Content Ideas, LinkedIn Posts and
/// News Articles sections.
pub fn render_text(result: &ResearchResult) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = write_search_results(&mut out, result);
    let _ = write_content_ideas(&mut out, result);
    let _ = write_posts(&mut out, result);
    let _ = write_news(&mut out, result);

    out
}

/// The result as pretty-printed JSON.
pub fn render_json(result: &ResearchResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}

/// The message shown next to a post's character count.
pub fn length_message(length: PostLength) -> &'static str {
    match length {
        PostLength::TooShort => "Warning: post might be too short",
        PostLength::Acceptable => "Post length is good!",
        PostLength::TooLong => "Error: post exceeds LinkedIn's limit!",
    }
}

fn write_heading(out: &mut String, title: &str) -> std::fmt::Result {
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out, "{}", title)?;
    writeln!(out, "{}\n", "=".repeat(RULE_WIDTH))
}

fn write_divider(out: &mut String) -> std::fmt::Result {
    writeln!(out, "{}\n", "-".repeat(RULE_WIDTH))
}

fn write_search_results(out: &mut String, result: &ResearchResult) -> std::fmt::Result {
    write_heading(out, "SEARCH RESULTS")?;

    if result.search_results.is_empty() {
        return writeln!(out, "No results found.\n");
    }

    for (idx, record) in result.search_results.iter().enumerate() {
        writeln!(out, "### Result {}", idx + 1)?;
        if !record.title.is_empty() && record.title != MISSING_TITLE {
            writeln!(out, "{}", record.title)?;
        }
        if !record.link.is_empty() {
            writeln!(out, "Link: {}", record.link)?;
        }
        if !record.snippet.is_empty() {
            writeln!(out, "{}", record.snippet)?;
        }
        writeln!(out)?;
        write_divider(out)?;
    }

    Ok(())
}

fn write_content_ideas(out: &mut String, result: &ResearchResult) -> std::fmt::Result {
    write_heading(out, "CONTENT IDEAS")?;

    match &result.content_ideas {
        Generated::Ready { value } => writeln!(out, "{}\n", value.0.trim()),
        Generated::Failed { .. } => writeln!(out, "Failed to generate content ideas.\n"),
    }
}

fn write_posts(out: &mut String, result: &ResearchResult) -> std::fmt::Result {
    write_heading(out, "LINKEDIN POSTS")?;

    let posts = match &result.linkedin_posts {
        Generated::Ready { value } => value,
        Generated::Failed { .. } => return writeln!(out, "Failed to generate LinkedIn posts.\n"),
    };

    if posts.is_empty() {
        return writeln!(out, "No posts were returned.\n");
    }

    for (idx, post) in posts.iter().enumerate() {
        writeln!(out, "Post {}", idx + 1)?;
        writeln!(out, "{}\n", post.0)?;
        writeln!(
            out,
            "Character count: {}/{} - {}",
            post.char_count(),
            POST_CHAR_LIMIT,
            length_message(post.length())
        )?;
        writeln!(out)?;
        write_divider(out)?;
    }

    Ok(())
}

fn write_news(out: &mut String, result: &ResearchResult) -> std::fmt::Result {
    write_heading(out, "NEWS ARTICLES")?;

    if result.news_articles.is_empty() {
        return writeln!(out, "No news articles found.\n");
    }

    for (idx, article) in result.news_articles.iter().enumerate() {
        writeln!(out, "### Article {}", idx + 1)?;
        writeln!(out, "{}", article.title)?;
        writeln!(out, "---")?;
        writeln!(out, "{}\n", article.content)?;
        write_divider(out)?;
    }

    Ok(())
}
