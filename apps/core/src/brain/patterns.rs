//! Static keyword tables and structural code patterns.
//!
//! Keywords are lowercase substrings: a text matches a table when its lowercased
//! form contains any entry, with no word-boundary handling. Code patterns run on
//! the original, case-preserved text.

use regex::Regex;
use std::sync::LazyLock;

use super::intent::Intent;

pub const SUMMARIZATION_KEYWORDS: &[&str] = &[
    "summarize",
    "summary",
    "tldr",
    "brief",
    "overview",
    "recap",
    "gist",
    "key points",
    "main points",
    "condense",
];

pub const SENTIMENT_KEYWORDS: &[&str] = &[
    "sentiment",
    "feeling",
    "emotion",
    "tone",
    "mood",
    "opinion",
    "attitude",
    "positive",
    "negative",
];

/// Only consulted for confidence scoring: code explanation is decided by the
/// structural patterns plus [`EXPLANATION_PHRASES`].
pub const CODE_EXPLANATION_KEYWORDS: &[&str] = &[
    "explain code",
    "what does this code",
    "code explanation",
    "how does this work",
    "analyze code",
    "review code",
    "debug",
    "find bugs",
    "what is this function",
];

pub const ACTION_ITEM_KEYWORDS: &[&str] = &[
    "action item",
    "action items",
    "todo",
    "to-do",
    "task",
    "tasks",
    "next steps",
    "follow up",
    "deliverable",
];

pub const YOUTUBE_KEYWORDS: &[&str] = &["youtube.com", "youtu.be", "youtube", "video transcript"];

/// Phrases that turn a code snippet into a code-explanation request.
pub const EXPLANATION_PHRASES: &[&str] = &[
    "explain",
    "what does",
    "how does",
    "what is",
    "analyze",
    "review",
    "understand",
    "clarify",
];

/// Verbs that count as a clear instruction when a file is attached.
pub const ACTION_VERBS: &[&str] = &[
    "summarize",
    "explain",
    "analyze",
    "extract",
    "find",
    "list",
    "show",
    "tell",
    "give",
    "identify",
    "detect",
    "calculate",
    "convert",
];

/// Query words that steer a fetched transcript towards a summary.
pub const TRANSCRIPT_SUMMARY_WORDS: &[&str] = &["summarize", "summary", "tldr"];

/// Query words that steer a fetched transcript towards sentiment analysis.
pub const TRANSCRIPT_SENTIMENT_WORDS: &[&str] = &["sentiment", "tone"];

const CODE_PATTERN_SOURCES: &[&str] = &[
    r"def\s+\w+\s*\(",         // Python function
    r"function\s+\w+\s*\(",    // JavaScript function
    r"class\s+\w+",            // Class definition
    r"import\s+[\w.]+",        // Import statement
    r"from\s+[\w.]+\s+import", // From import
    r"const\s+\w+\s*=",
    r"let\s+\w+\s*=",
    r"var\s+\w+\s*=",
    r"public\s+\w+", // Java/C#
    r"private\s+\w+",
    r"```[\s\S]*?```", // Fenced block
];

pub static CODE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    CODE_PATTERN_SOURCES
        .iter()
        .map(|source| Regex::new(source).expect("Invalid regex: code structure pattern"))
        .collect()
});

/// The keyword table owned by `intent`. Intents reached only by fallback have none.
pub fn keywords_for(intent: Intent) -> &'static [&'static str] {
    match intent {
        Intent::Summarization => SUMMARIZATION_KEYWORDS,
        Intent::SentimentAnalysis => SENTIMENT_KEYWORDS,
        Intent::CodeExplanation => CODE_EXPLANATION_KEYWORDS,
        Intent::ActionItems => ACTION_ITEM_KEYWORDS,
        Intent::YoutubeTranscript => YOUTUBE_KEYWORDS,
        Intent::NeedsClarification | Intent::Conversational => &[],
    }
}

/// True when `text_lower` contains any entry of `words` as a substring.
pub fn contains_any(text_lower: &str, words: &[&str]) -> bool {
    words.iter().any(|word| text_lower.contains(word))
}

/// Number of entries of `words` found in `text_lower`.
pub fn count_matches(text_lower: &str, words: &[&str]) -> usize {
    words.iter().filter(|word| text_lower.contains(*word)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_code_patterns_compile() {
        assert_eq!(CODE_PATTERNS.len(), CODE_PATTERN_SOURCES.len());
    }

    #[test]
    fn test_fenced_block_spans_lines() {
        let text = "look:\n```\nx = 1\ny = 2\n```";
        assert!(CODE_PATTERNS.iter().any(|p| p.is_match(text)));
    }

    #[test]
    fn test_keyword_tables_are_lowercase() {
        for intent in Intent::ALL {
            for keyword in keywords_for(intent) {
                assert_eq!(*keyword, keyword.to_lowercase(), "{} in {}", keyword, intent);
            }
        }
    }

    #[test]
    fn test_substring_containment_is_not_word_aware() {
        assert!(contains_any("the multitasking scheduler", ACTION_ITEM_KEYWORDS));
        assert_eq!(count_matches("summarize this summary", SUMMARIZATION_KEYWORDS), 2);
    }
}
