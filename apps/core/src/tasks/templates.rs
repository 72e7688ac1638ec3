//! Prompt templates, one per task.
//!
//! Each template fixes the output format the model is asked to follow. The
//! format is advisory: completions are passed through untouched.

use crate::brain::patterns::{self, TRANSCRIPT_SENTIMENT_WORDS, TRANSCRIPT_SUMMARY_WORDS};
use crate::brain::Intent;

/// Marker separating the user's text from a fetched video transcript.
pub const TRANSCRIPT_MARKER: &str = "[YouTube Transcript]:";
/// Marker separating the user's text from text extracted out of an upload.
pub const EXTRACTED_MARKER: &str = "[Extracted Content]:";

pub const SUMMARY_MAX_TOKENS: u32 = 1500;
pub const SENTIMENT_MAX_TOKENS: u32 = 500;
pub const CODE_MAX_TOKENS: u32 = 2000;
pub const ACTIONS_MAX_TOKENS: u32 = 1000;
pub const CLARIFICATION_MAX_TOKENS: u32 = 300;
pub const CONVERSATIONAL_MAX_TOKENS: u32 = 1000;
pub const TRANSCRIPT_MISSING_MAX_TOKENS: u32 = 500;

/// Characters of content shown to the model when asking for clarification.
const CLARIFICATION_PREVIEW_CHARS: usize = 200;

/// Task label reported for the clarification template. Deliberately distinct
/// from the `needs_clarification` intent label.
pub const CLARIFICATION_LABEL: &str = "clarification";

/// A fully built prompt, ready for the model.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSpec {
    pub prompt: String,
    pub max_tokens: u32,
    pub task_label: &'static str,
}

/// Selects and fills the template for `intent`.
///
/// `YoutubeTranscript` resolves here: with a transcript present it becomes a
/// summary (or sentiment analysis when the query asks about tone), without one
/// it becomes the limitation notice.
pub fn build(intent: Intent, content: &str, query: &str) -> PromptSpec {
    match intent {
        Intent::Summarization => PromptSpec {
            prompt: summary_prompt(content),
            max_tokens: SUMMARY_MAX_TOKENS,
            task_label: Intent::Summarization.label(),
        },
        Intent::SentimentAnalysis => PromptSpec {
            prompt: sentiment_prompt(content),
            max_tokens: SENTIMENT_MAX_TOKENS,
            task_label: Intent::SentimentAnalysis.label(),
        },
        Intent::CodeExplanation => PromptSpec {
            prompt: code_prompt(content),
            max_tokens: CODE_MAX_TOKENS,
            task_label: Intent::CodeExplanation.label(),
        },
        Intent::ActionItems => PromptSpec {
            prompt: actions_prompt(content),
            max_tokens: ACTIONS_MAX_TOKENS,
            task_label: Intent::ActionItems.label(),
        },
        Intent::NeedsClarification => PromptSpec {
            prompt: clarification_prompt(content, query),
            max_tokens: CLARIFICATION_MAX_TOKENS,
            task_label: CLARIFICATION_LABEL,
        },
        Intent::Conversational => PromptSpec {
            prompt: conversational_prompt(content, query),
            max_tokens: CONVERSATIONAL_MAX_TOKENS,
            task_label: Intent::Conversational.label(),
        },
        Intent::YoutubeTranscript => match transcript_route(content, query) {
            Some(routed) => build(routed, content, query),
            None => PromptSpec {
                prompt: transcript_missing_prompt(query),
                max_tokens: TRANSCRIPT_MISSING_MAX_TOKENS,
                task_label: Intent::YoutubeTranscript.label(),
            },
        },
    }
}

/// Where a YouTube request goes once the transcript question is settled.
/// `None` means no transcript reached us.
pub fn transcript_route(content: &str, query: &str) -> Option<Intent> {
    if !content.contains(TRANSCRIPT_MARKER) {
        return None;
    }

    let query_lower = query.to_lowercase();
    if patterns::contains_any(&query_lower, TRANSCRIPT_SUMMARY_WORDS) {
        Some(Intent::Summarization)
    } else if patterns::contains_any(&query_lower, TRANSCRIPT_SENTIMENT_WORDS) {
        Some(Intent::SentimentAnalysis)
    } else {
        Some(Intent::Summarization)
    }
}

pub fn summary_prompt(content: &str) -> String {
    format!(
        r#"Provide a comprehensive summary in this EXACT format:

**One-line summary:** [Write a single, concise sentence capturing the main point]

**Key Points:**
• [First key point]
• [Second key point]
• [Third key point]

**Detailed Summary:**
[Write exactly 5 sentences providing a thorough overview of the content. Cover the main themes, important details, and conclusions.]

Content to summarize:
{content}
"#
    )
}

pub fn sentiment_prompt(content: &str) -> String {
    format!(
        r#"Analyze the sentiment of the following content and return in this EXACT format:

**Sentiment:** [Choose: Positive, Negative, Neutral, or Mixed]
**Confidence:** [Provide percentage, e.g., 85%]
**Justification:** [Write ONE clear sentence explaining why you chose this sentiment]

Content to analyze:
{content}
"#
    )
}

pub fn code_prompt(content: &str) -> String {
    format!(
        r#"Analyze this code and provide a comprehensive explanation in this format:

**Purpose:**
[Explain what this code is designed to do]

**Logic Explanation:**
[Provide a step-by-step breakdown of how the code works]

**Bugs/Issues:**
[Identify any bugs, potential issues, or code smells. If none found, state "No obvious bugs detected."]

**Complexity Analysis:**
[Provide time and space complexity analysis if applicable. Use Big O notation.]

Code to analyze:
{content}
"#
    )
}

pub fn actions_prompt(content: &str) -> String {
    format!(
        r#"Extract all action items, tasks, and to-dos from the following content.

Format your response as:

**Action Items:**
1. [Action item with owner if mentioned and deadline if specified]
2. [Action item with owner if mentioned and deadline if specified]
...

If no action items are found, respond with: "No action items found in the content."

Content to analyze:
{content}
"#
    )
}

pub fn clarification_prompt(content: &str, query: &str) -> String {
    let preview: String = content.chars().take(CLARIFICATION_PREVIEW_CHARS).collect();
    format!(
        r#"The user has provided content but hasn't clearly specified what they want to do with it.

Ask them a short, clear clarifying question. Examples:
- "What would you like me to do with this content? I can summarize it, analyze sentiment, explain code, extract action items, or answer questions about it."
- "How can I help you with this file?"
- "What specific information are you looking for from this content?"

Keep the question friendly and concise. Offer specific options based on what seems most relevant.

User's query: {query}
Content provided: {preview}...
"#
    )
}

/// The content is only repeated as context when it differs from the query,
/// i.e. when an upload or transcript was appended.
pub fn conversational_prompt(content: &str, query: &str) -> String {
    let context = if content != query {
        format!("Context: {content}")
    } else {
        String::new()
    };
    format!(
        r#"Provide a helpful, friendly response to the user's question or comment.

Be concise but informative. If the user is asking about specific content, reference it directly.

User's query: {query}
{context}
"#
    )
}

pub fn transcript_missing_prompt(query: &str) -> String {
    format!(
        r#"The user provided a YouTube URL but the transcript could not be fetched automatically.

Explain this limitation politely and suggest:
1. They can try pasting the transcript manually if they have access to it
2. They can describe what they'd like to know about the video
3. They can try again later, or with a video that has captions enabled

User's query: {query}
"#
    )
}
