//! Intent Classification using keyword tables and code-structure patterns.
//!
//! Deterministic and side-effect free apart from logging. The decision order
//! below is part of the contract: the first rule that fires wins.
//!
//! 1. YouTube keyword
//! 2. code structure + explanation phrase
//! 3. keyword tables for summarization, sentiment, action items (in that order)
//! 4. attachment without a clear instruction
//! 5. conversational fallback

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use super::patterns::{self, ACTION_VERBS, CODE_PATTERNS, EXPLANATION_PHRASES, YOUTUBE_KEYWORDS};

/// Shortest text still considered capable of carrying an instruction.
const MIN_INSTRUCTION_CHARS: usize = 5;

/// Detected intent type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Condense the content into a structured summary
    Summarization,
    /// Classify the emotional tone of the content
    SentimentAnalysis,
    /// Explain a code snippet
    CodeExplanation,
    /// Pull tasks and to-dos out of the content
    ActionItems,
    /// The text references a YouTube video
    YoutubeTranscript,
    /// A file arrived without a usable instruction
    NeedsClarification,
    /// General question or chat
    Conversational,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Intent {
    pub const ALL: [Intent; 7] = [
        Intent::Summarization,
        Intent::SentimentAnalysis,
        Intent::CodeExplanation,
        Intent::ActionItems,
        Intent::YoutubeTranscript,
        Intent::NeedsClarification,
        Intent::Conversational,
    ];

    /// Returns the wire label for the intent
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Summarization => "summarization",
            Intent::SentimentAnalysis => "sentiment_analysis",
            Intent::CodeExplanation => "code_explanation",
            Intent::ActionItems => "action_items",
            Intent::YoutubeTranscript => "youtube_transcript",
            Intent::NeedsClarification => "needs_clarification",
            Intent::Conversational => "conversational",
        }
    }

    /// Parses a wire label. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Intent> {
        Intent::ALL
            .into_iter()
            .find(|intent| intent.label() == label.trim())
    }
}

/// Keyword tables scanned at step 3, in priority order.
const KEYWORD_SCAN_ORDER: [Intent; 3] = [
    Intent::Summarization,
    Intent::SentimentAnalysis,
    Intent::ActionItems,
];

/// Input to a classification
#[derive(Debug, Clone, Copy)]
pub struct ClassificationInput<'a> {
    pub text: &'a str,
    pub has_attachment: bool,
}

impl<'a> ClassificationInput<'a> {
    pub fn new(text: &'a str, has_attachment: bool) -> Self {
        Self {
            text,
            has_attachment,
        }
    }
}

/// Result of intent classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Detected intent
    pub intent: Intent,
    /// Keyword-density score (0.0 - 1.0), informational only
    pub confidence: f32,
}

/// Rule-based intent classifier
#[derive(Debug, Clone, Copy)]
pub struct IntentClassifier {
    code_patterns: &'static [Regex],
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    pub fn new() -> Self {
        Self {
            code_patterns: CODE_PATTERNS.as_slice(),
        }
    }

    /// Classify the intent of a request.
    pub fn classify(&self, text: &str, has_attachment: bool) -> Intent {
        let text_lower = text.trim().to_lowercase();

        if patterns::contains_any(&text_lower, YOUTUBE_KEYWORDS) {
            info!("Intent: YouTube transcript detected");
            return Intent::YoutubeTranscript;
        }

        if self.contains_code(text) && patterns::contains_any(&text_lower, EXPLANATION_PHRASES) {
            info!("Intent: Code explanation detected");
            return Intent::CodeExplanation;
        }

        for intent in KEYWORD_SCAN_ORDER {
            if patterns::contains_any(&text_lower, patterns::keywords_for(intent)) {
                info!("Intent: {} detected via keywords", intent);
                return intent;
            }
        }

        if has_attachment && !has_clear_instruction(&text_lower) {
            info!("Intent: Needs clarification (file without clear instruction)");
            return Intent::NeedsClarification;
        }

        info!("Intent: Conversational (default)");
        Intent::Conversational
    }

    /// Confidence for the intent `classify` picks on the same input.
    ///
    /// Clarification is always 0.0. Otherwise the intent's own keywords are
    /// counted: two or more give 0.95, one gives 0.75, none (code pattern or
    /// fallback path) gives 0.5.
    pub fn confidence(&self, text: &str, has_attachment: bool) -> f32 {
        let intent = self.classify(text, has_attachment);
        score_for(intent, text)
    }

    /// Intent and confidence in one pass.
    pub fn analyze(&self, input: ClassificationInput<'_>) -> ClassificationResult {
        let intent = self.classify(input.text, input.has_attachment);
        ClassificationResult {
            intent,
            confidence: score_for(intent, input.text),
        }
    }

    fn contains_code(&self, text: &str) -> bool {
        self.code_patterns.iter().any(|pattern| pattern.is_match(text))
    }
}

fn score_for(intent: Intent, text: &str) -> f32 {
    if intent == Intent::NeedsClarification {
        return 0.0;
    }

    let text_lower = text.to_lowercase();
    match patterns::count_matches(&text_lower, patterns::keywords_for(intent)) {
        0 => 0.5,
        1 => 0.75,
        _ => 0.95,
    }
}

fn has_clear_instruction(text_lower: &str) -> bool {
    if text_lower.chars().count() < MIN_INSTRUCTION_CHARS {
        return false;
    }
    patterns::contains_any(text_lower, ACTION_VERBS)
}
