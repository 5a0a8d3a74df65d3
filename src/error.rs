use thiserror::Error;

use crate::VideoId;

/// Failures while resolving a video and pulling its captions
#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("no YouTube video ID found in: {0}")]
    InvalidUrl(String),

    #[error("YouTube is throttling requests (captcha served) for video {0}; try again later")]
    RateLimited(VideoId),

    #[error("video {0} is unavailable")]
    VideoUnavailable(VideoId),

    #[error("transcripts are disabled for video {0}")]
    TranscriptDisabled(VideoId),

    #[error("no transcript is available for video {0}")]
    TranscriptNotAvailable(VideoId),

    #[error("no transcript in '{lang}' for video {video_id}; available: {}", .available.join(", "))]
    LanguageNotAvailable {
        video_id: VideoId,
        lang: String,
        available: Vec<String>,
    },

    #[error("no transcript available")]
    NoTranscript,

    #[error("caption payload for video {0} contained no segments")]
    Empty(VideoId),

    #[error("caption payload could not be parsed: {0}")]
    CaptionParse(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl TranscriptError {
    pub fn code(&self) -> &'static str {
        match self {
            TranscriptError::InvalidUrl(_) => "invalid_url",
            TranscriptError::RateLimited(_) => "rate_limited",
            TranscriptError::VideoUnavailable(_) => "video_unavailable",
            TranscriptError::TranscriptDisabled(_) => "transcript_disabled",
            TranscriptError::TranscriptNotAvailable(_) => "transcript_not_available",
            TranscriptError::LanguageNotAvailable { .. } => "language_not_available",
            TranscriptError::NoTranscript => "no_transcript",
            TranscriptError::Empty(_) => "transcript_error",
            TranscriptError::CaptionParse(_) => "transcript_error",
            TranscriptError::Http(_) => "upstream_http",
        }
    }

    /// Only a captcha page is worth retrying later; everything else is terminal.
    pub fn is_transient(&self) -> bool {
        matches!(self, TranscriptError::RateLimited(_))
    }
}

/// A single failed call to one model backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{model}: {message}")]
pub struct ModelError {
    pub model: String,
    pub status: Option<u16>,
    pub message: String,
}

impl ModelError {
    pub fn new(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("{0} is not configured")]
    NotConfigured(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("all models are at capacity or rate limited; last error: {last}")]
    ModelsExhausted { last: ModelError },

    #[error("no candidate models to try")]
    NoCandidates,
}

impl GenerationError {
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::NotConfigured(_) => "not_configured",
            GenerationError::Model(_) => "generation_failed",
            GenerationError::ModelsExhausted { .. } => "models_exhausted",
            GenerationError::NoCandidates => "generation_failed",
        }
    }
}

/// Anything the end-to-end pipeline can fail with
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Transcript(#[from] TranscriptError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("too many requests: limit is {limit} per minute")]
    TooManyRequests { limit: u32 },
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::Transcript(e) => e.code(),
            Error::Generation(e) => e.code(),
            Error::TooManyRequests { .. } => "too_many_requests",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
