//! # Content Generator Module
//!
//! Two single-shot prompts over the whole keyword set:
//! - content ideas (five `###`-separated ideas)
//! - LinkedIn posts derived from those ideas (five `###`-separated drafts)
//!
//! A failed model call is not an error to the caller; it comes back as
//! [`Generated::Failed`] so the report can still be rendered.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::llm::{payload_text, LanguageModel};

/// Separator the prompts ask the model to put between sections.
pub const SECTION_MARKER: &str = "###";

/// LinkedIn's hard limit on post length, in characters.
pub const POST_CHAR_LIMIT: usize = 3000;

/// Below this many characters a post is flagged as thin.
pub const POST_MIN_CHARS: usize = 200;

const IDEAS_PREAMBLE: &str = r#"
You are a creative content idea generator.

- Generate engaging content ideas based on keywords.
- Format the output in clear markdown.
- Be specific and actionable in your suggestions.
"#;

const POSTS_PREAMBLE: &str = r#"
You are an expert LinkedIn copywriter who transforms content ideas into engaging posts.

- Convert content ideas into compelling LinkedIn posts
- Create text-only posts that drive engagement
- Use professional copywriting techniques
- Focus on value delivery and storytelling
- Maintain LinkedIn's best practices
"#;

// =============================================================================
// DATA TYPES
// =============================================================================
/// Outcome of one generation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Generated<T> {
    Ready { value: T },
    Failed { reason: String },
}

impl<T> Generated<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Generated::Ready { value } => Some(value),
            Generated::Failed { .. } => None,
        }
    }
}

/// Markdown text holding the generated ideas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentIdeaSet(pub String);

/// One LinkedIn post draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostDraft(pub String);

/// Where a post's length falls relative to LinkedIn's limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostLength {
    /// Under [`POST_MIN_CHARS`]
    TooShort,
    Acceptable,
    /// Over [`POST_CHAR_LIMIT`]
    TooLong,
}

impl PostLength {
    pub fn classify(char_count: usize) -> Self {
        if char_count > POST_CHAR_LIMIT {
            PostLength::TooLong
        } else if char_count < POST_MIN_CHARS {
            PostLength::TooShort
        } else {
            PostLength::Acceptable
        }
    }
}

impl PostDraft {
    /// Length in characters, as LinkedIn counts them.
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    pub fn length(&self) -> PostLength {
        PostLength::classify(self.char_count())
    }
}

/// Split generator output into drafts.
///
/// Everything before the first marker is preamble and is dropped; each
/// remaining section is trimmed and blank sections are skipped.
pub fn split_posts(text: &str) -> Vec<PostDraft> {
    text.split(SECTION_MARKER)
        .skip(1)
        .map(str::trim)
        .filter(|section| !section.is_empty())
        .map(|section| PostDraft(section.to_string()))
        .collect()
}

// =============================================================================
// GENERATOR
// =============================================================================
/// Prompts the model for ideas and posts. Stateless between calls.
#[derive(Clone)]
pub struct ContentGenerator {
    model: Arc<dyn LanguageModel>,
}

impl ContentGenerator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// One idea set for the whole keyword list.
    pub async fn generate_ideas(&self, keywords: &[String]) -> Generated<ContentIdeaSet> {
        info!(keywords = keywords.len(), "Generating content ideas");

        match self
            .model
            .chat(IDEAS_PREAMBLE, &ideas_prompt(keywords), false)
            .await
        {
            Ok(payload) => Generated::Ready {
                value: ContentIdeaSet(payload_text(&payload)),
            },
            Err(e) => {
                warn!(error = %e, "Content generation failed");
                Generated::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Post drafts built from the idea set.
    ///
    /// When the ideas failed, the posts are drafted straight from the
    /// keywords instead of being skipped.
    pub async fn generate_posts(
        &self,
        keywords: &[String],
        ideas: &Generated<ContentIdeaSet>,
    ) -> Generated<Vec<PostDraft>> {
        info!("Generating LinkedIn posts");

        let prompt = posts_prompt(keywords, ideas.ready());

        match self.model.chat(POSTS_PREAMBLE, &prompt, false).await {
            Ok(payload) => {
                let drafts = split_posts(&payload_text(&payload));
                info!(count = drafts.len(), "LinkedIn posts generated");
                Generated::Ready { value: drafts }
            }
            Err(e) => {
                warn!(error = %e, "LinkedIn post generation failed");
                Generated::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

fn ideas_prompt(keywords: &[String]) -> String {
    format!(
        "Given these keywords: {}\n\
         Generate 5 content ideas that would be interesting and engaging.\n\
         For each idea, provide:\n\
         1. A catchy title\n\
         2. A brief description\n\
         3. Key points to cover\n\
         \n\
         Format each idea clearly with {} separators.",
        keywords.join(", "),
        SECTION_MARKER
    )
}

fn posts_prompt(keywords: &[String], ideas: Option<&ContentIdeaSet>) -> String {
    let source = match ideas {
        Some(ContentIdeaSet(text)) => format!("Based on these content ideas:\n\n{}", text),
        None => format!(
            "No content ideas are available. Base the posts directly on these keywords: {}",
            keywords.join(", ")
        ),
    };

    format!(
        "{source}\n\n\
         Topics: {topics}\n\n\
         Transform them into 5 engaging LinkedIn posts. For each post:\n\n\
         1. HOOK: Start with a powerful hook (question/statistic/statement)\n\
         2. STORY/VALUE: Share insights or key points from the content\n\
         3. CREDIBILITY: Include relevant data or experience\n\
         4. VALUE DELIVERY: Explain the main benefit for readers\n\
         5. CTA: End with a clear call-to-action\n\
         6. HASHTAGS: Add 3-5 relevant hashtags\n\n\
         Make posts:\n\
         - Conversational yet professional\n\
         - Easy to read (use line breaks)\n\
         - Around 1000-1300 characters\n\
         - Ready to copy and share\n\
         - No images or emojis\n\n\
         Format each post with {marker} separators.",
        source = source,
        topics = keywords.join(", "),
        marker = SECTION_MARKER
    )
}
