pub mod cache;
pub mod config;
pub mod error;
pub mod llm;
pub mod output;
pub mod parse;
pub mod pipeline;
pub mod summarize;
pub mod youtube;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub use error::{Error, GenerationError, ModelError, Result, TranscriptError};

/// A single captioned segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    /// Seconds from the start of the video
    pub offset: f64,
    pub duration: f64,
    pub lang: String,
}

/// Canonical 11-character YouTube video identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

static BARE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("valid regex"));

// watch?v=, embed/, v/, e/, shorts/, youtu.be/ and youtube.com/<a>/<b>/ID
static URL_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:youtube\.com/(?:[^/\s]+/.+/|(?:v|e(?:mbed)?|shorts|live)/|.*[?&]v=)|youtu\.be/)([a-zA-Z0-9_-]{11})")
        .expect("valid regex")
});

impl VideoId {
    /// Accept only an already-canonical identifier
    pub fn parse(input: &str) -> Option<Self> {
        BARE_ID.is_match(input).then(|| VideoId(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract video ID from various YouTube URL formats
pub fn extract_video_id(input: &str) -> Option<VideoId> {
    let input = input.trim();

    if let Some(id) = VideoId::parse(input) {
        return Some(id);
    }

    URL_ID
        .captures(input)
        .map(|caps| VideoId(caps[1].to_string()))
}

/// Like [`extract_video_id`], but as a typed failure
pub fn resolve_video_id(input: &str) -> std::result::Result<VideoId, TranscriptError> {
    extract_video_id(input).ok_or_else(|| TranscriptError::InvalidUrl(input.to_string()))
}

/// Join segment texts with single spaces, in order
pub fn flatten(segments: &[TranscriptSegment]) -> std::result::Result<String, TranscriptError> {
    if segments.is_empty() {
        return Err(TranscriptError::NoTranscript);
    }

    Ok(segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Option<String> {
        extract_video_id(s).map(|v| v.to_string())
    }

    fn segment(text: &str, offset: f64) -> TranscriptSegment {
        TranscriptSegment {
            text: text.to_string(),
            offset,
            duration: 1.0,
            lang: "en".to_string(),
        }
    }

    #[test]
    fn test_bare_video_id() {
        assert_eq!(id("dQw4w9WgXcQ"), Some("dQw4w9WgXcQ".to_string()));
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(
            id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_watch_url_with_extra_params() {
        assert_eq!(
            id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=120"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            id("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_short_url() {
        assert_eq!(id("https://youtu.be/dQw4w9WgXcQ"), Some("dQw4w9WgXcQ".to_string()));
        assert_eq!(id("youtu.be/dQw4w9WgXcQ?si=abc"), Some("dQw4w9WgXcQ".to_string()));
    }

    #[test]
    fn test_embed_and_v_urls() {
        assert_eq!(
            id("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(id("https://www.youtube.com/v/dQw4w9WgXcQ"), Some("dQw4w9WgXcQ".to_string()));
    }

    #[test]
    fn test_nested_path_url() {
        assert_eq!(
            id("https://www.youtube.com/user/somebody/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_shorts_url() {
        assert_eq!(
            id("https://www.youtube.com/shorts/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_invalid_url() {
        assert_eq!(id("not-a-valid-id"), None);
        assert_eq!(id("https://vimeo.com/123456789"), None);
        assert_eq!(id("https://www.youtube.com/watch?v=short"), None);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(id(""), None);
    }

    #[test]
    fn test_whitespace_trimming() {
        assert_eq!(id("  dQw4w9WgXcQ  "), Some("dQw4w9WgXcQ".to_string()));
    }

    #[test]
    fn test_resolve_video_id_invalid() {
        let err = resolve_video_id("nope").unwrap_err();
        assert!(matches!(err, TranscriptError::InvalidUrl(ref s) if s == "nope"));
    }

    #[test]
    fn test_flatten_joins_with_spaces() {
        let segments = vec![segment("hello", 0.0), segment("world", 1.0)];
        assert_eq!(flatten(&segments).unwrap(), "hello world");
        assert_eq!(flatten(&segments).unwrap(), flatten(&segments).unwrap());
    }

    #[test]
    fn test_flatten_keeps_inner_whitespace() {
        let segments = vec![segment("  a  b", 0.0), segment("C", 1.0)];
        assert_eq!(flatten(&segments).unwrap(), "  a  b C");
    }

    #[test]
    fn test_flatten_empty() {
        assert!(matches!(flatten(&[]), Err(TranscriptError::NoTranscript)));
    }
}
