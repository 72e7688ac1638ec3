//! YouTube URL detection and transcript retrieval.

use crate::error::AppError;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{error, info, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.youtube.com";
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

const URL_PATTERN_SOURCES: &[&str] = &[
    r"(?:https?://)?(?:www\.)?youtube\.com/watch\?v=([a-zA-Z0-9_-]{11})",
    r"(?:https?://)?(?:www\.)?youtu\.be/([a-zA-Z0-9_-]{11})",
    r"(?:https?://)?(?:www\.)?youtube\.com/embed/([a-zA-Z0-9_-]{11})",
];

static URL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    URL_PATTERN_SOURCES
        .iter()
        .map(|source| Regex::new(source).expect("Invalid regex: YouTube URL pattern"))
        .collect()
});

static TIMED_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<text start="([\d.]+)"[^>]*>([\s\S]*?)</text>"#)
        .expect("Invalid regex: timedtext segment")
});

/// One caption line.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub start: f64,
    pub text: String,
}

/// First YouTube link in `text`, rewritten as a canonical watch URL.
pub fn extract_url(text: &str) -> Option<String> {
    let video_id = extract_video_id(text)?;
    let url = format!("https://www.youtube.com/watch?v={}", video_id);
    info!("YouTube URL detected: {}", url);
    Some(url)
}

/// The 11-character video id of the first YouTube link in `url`.
pub fn extract_video_id(url: &str) -> Option<String> {
    URL_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|id| id.as_str().to_string())
}

/// Seconds as `MM:SS`. Minutes keep counting past the hour.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// One `[MM:SS] text` line per segment.
pub fn format_transcript(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|segment| format!("[{}] {}", format_timestamp(segment.start), segment.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Segment text joined with single spaces.
pub fn join_segments(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|segment| segment.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Source of video transcripts. `None` covers every kind of failure.
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    async fn fetch_transcript(&self, url: &str) -> Option<String>;
}

/// Fetches captions from YouTube's timedtext endpoint.
#[derive(Debug, Clone)]
pub struct TimedTextFetcher {
    client: Client,
    base_url: String,
    language: String,
    timestamps: bool,
}

impl TimedTextFetcher {
    pub fn new(base_url: impl Into<String>, language: impl Into<String>, timestamps: bool) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            language: language.into(),
            timestamps,
        }
    }

    /// Preferred language first, then auto-generated captions.
    pub async fn fetch_segments(&self, video_id: &str) -> Result<Vec<TranscriptSegment>, AppError> {
        info!("Fetching transcript for video: {}", video_id);

        let segments = self.request(video_id, None).await?;
        if !segments.is_empty() {
            return Ok(segments);
        }

        info!(
            "No {} transcript found, trying auto-generated captions",
            self.language
        );
        self.request(video_id, Some("asr")).await
    }

    async fn request(&self, video_id: &str, kind: Option<&str>) -> Result<Vec<TranscriptSegment>, AppError> {
        let mut url = Url::parse(&self.base_url)?.join("api/timedtext")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("v", video_id);
            query.append_pair("lang", &self.language);
            if let Some(kind) = kind {
                query.append_pair("kind", kind);
            }
        }

        let res = self
            .client
            .get(url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(AppError::Http(format!(
                "Transcript request failed with status {}",
                res.status()
            )));
        }

        let body = res.text().await?;
        Ok(parse_timed_text(&body))
    }
}

#[async_trait]
impl TranscriptFetcher for TimedTextFetcher {
    async fn fetch_transcript(&self, url: &str) -> Option<String> {
        let Some(video_id) = extract_video_id(url) else {
            error!("Could not extract video ID from URL: {}", url);
            return None;
        };

        match self.fetch_segments(&video_id).await {
            Ok(segments) if segments.is_empty() => {
                warn!("No transcript found for video: {}", url);
                None
            }
            Ok(segments) => {
                let transcript = if self.timestamps {
                    format_transcript(&segments)
                } else {
                    join_segments(&segments)
                };
                info!(
                    "Transcript fetched successfully. Length: {} characters",
                    transcript.chars().count()
                );
                Some(transcript)
            }
            Err(e) => {
                error!("Error fetching transcript: {}", e);
                None
            }
        }
    }
}

/// Reads `<text start=".." dur="..">..</text>` elements. Empty lines are dropped.
pub fn parse_timed_text(xml: &str) -> Vec<TranscriptSegment> {
    TIMED_TEXT
        .captures_iter(xml)
        .filter_map(|caps| {
            let start = caps.get(1)?.as_str().parse::<f64>().ok()?;
            let text = decode_entities(caps.get(2)?.as_str());
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            (!text.is_empty()).then_some(TranscriptSegment { start, text })
        })
        .collect()
}

/// Captions arrive double-escaped (`&amp;#39;`), so `&amp;` goes first.
fn decode_entities(raw: &str) -> String {
    raw.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
}
