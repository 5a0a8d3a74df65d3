use async_trait::async_trait;
use log::{debug, info};
use serde::Serialize;

use crate::llm::{ChatModel, Message};
use crate::parse::parse_result;
use crate::summarize::{PlanTier, Summarizer};
use crate::youtube::TranscriptSource;
use crate::{Error, Result, TranscriptSegment, VideoId, flatten, resolve_video_id};

/// One summarization request from the outer layer
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub url: String,
    pub lang: Option<String>,
    pub tier: PlanTier,
    pub quick: bool,
}

/// Everything the caller needs to display or persist a summary
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub video_id: VideoId,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub action_steps: Vec<String>,
    pub transcript: String,
}

/// Per-minute request counter, backed by whatever store the caller owns
#[async_trait]
pub trait RequestCounter: Send + Sync {
    /// Record one request for `key` and return the count in the current minute
    async fn hit(&self, key: &str) -> Result<u32>;
}

/// Reject the request once the tier's per-minute allowance is used up
pub async fn admit<C>(counter: &C, user: &str, tier: PlanTier) -> Result<()>
where
    C: RequestCounter + ?Sized,
{
    let limit = tier.requests_per_minute();
    let count = counter.hit(user).await?;
    debug!("{user}: {count}/{limit} requests this minute");

    if count > limit {
        return Err(Error::TooManyRequests { limit });
    }
    Ok(())
}

/// URL -> transcript -> summary, with the fetcher and model injected
pub struct Pipeline<S, M> {
    source: S,
    summarizer: Summarizer<M>,
}

impl<S: TranscriptSource, M: ChatModel> Pipeline<S, M> {
    pub fn new(source: S, model: M) -> Self {
        Self {
            source,
            summarizer: Summarizer::new(model),
        }
    }

    pub async fn transcript(&self, url: &str, lang: Option<&str>) -> Result<(VideoId, Vec<TranscriptSegment>)> {
        let video_id = resolve_video_id(url)?;
        let segments = self.source.fetch_segments(&video_id, lang).await?;
        Ok((video_id, segments))
    }

    pub async fn summarize(&self, req: &SummaryRequest) -> Result<SummaryReport> {
        let (video_id, segments) = self.transcript(&req.url, req.lang.as_deref()).await?;
        let transcript = flatten(&segments)?;
        info!(
            "Summarizing {video_id}: {} segments, tier={}, quick={}",
            segments.len(),
            req.tier,
            req.quick
        );

        let raw = self.summarizer.generate(&transcript, req.tier, req.quick).await?;
        let result = parse_result(&raw);

        Ok(SummaryReport {
            video_id,
            title: result.title,
            summary: result.summary,
            content: result.content,
            action_steps: result.action_steps,
            transcript,
        })
    }

    /// Follow-up question against an already flattened transcript
    pub async fn ask(&self, transcript: &str, history: &[Message], question: &str, tier: PlanTier) -> Result<String> {
        Ok(self.summarizer.chat(transcript, history, question, tier).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::{ModelError, TranscriptError};

    struct CountingStore {
        counts: Mutex<HashMap<String, u32>>,
    }

    #[async_trait]
    impl RequestCounter for CountingStore {
        async fn hit(&self, key: &str) -> Result<u32> {
            let mut counts = self.counts.lock().unwrap();
            let count = counts.entry(key.to_string()).or_default();
            *count += 1;
            Ok(*count)
        }
    }

    struct NoCaptions;

    #[async_trait]
    impl TranscriptSource for NoCaptions {
        async fn fetch_segments(
            &self,
            video_id: &VideoId,
            _: Option<&str>,
        ) -> std::result::Result<Vec<TranscriptSegment>, TranscriptError> {
            Err(TranscriptError::TranscriptDisabled(video_id.clone()))
        }
    }

    struct EmptyCaptions;

    #[async_trait]
    impl TranscriptSource for EmptyCaptions {
        async fn fetch_segments(
            &self,
            _: &VideoId,
            _: Option<&str>,
        ) -> std::result::Result<Vec<TranscriptSegment>, TranscriptError> {
            Ok(Vec::new())
        }
    }

    struct Unreachable;

    #[async_trait]
    impl ChatModel for Unreachable {
        async fn complete(&self, model: &str, _: &[Message]) -> std::result::Result<String, ModelError> {
            panic!("{model} must not be called");
        }
    }

    fn request(url: &str) -> SummaryRequest {
        SummaryRequest {
            url: url.to_string(),
            lang: None,
            tier: PlanTier::Basic,
            quick: false,
        }
    }

    #[tokio::test]
    async fn test_admit_enforces_tier_allowance() {
        let store = CountingStore {
            counts: Mutex::new(HashMap::new()),
        };

        for _ in 0..10 {
            admit(&store, "alice", PlanTier::Plus).await.unwrap();
        }
        let err = admit(&store, "alice", PlanTier::Plus).await.unwrap_err();
        assert!(matches!(err, Error::TooManyRequests { limit: 10 }));
        assert_eq!(err.code(), "too_many_requests");

        // Pro has a larger allowance and other users are independent
        admit(&store, "alice", PlanTier::Pro).await.unwrap();
        admit(&store, "bob", PlanTier::Basic).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_url_short_circuits() {
        let pipeline = Pipeline::new(NoCaptions, Unreachable);
        let err = pipeline.summarize(&request("https://example.com")).await.unwrap_err();
        assert_eq!(err.code(), "invalid_url");
    }

    #[tokio::test]
    async fn test_fetch_errors_propagate_typed() {
        let pipeline = Pipeline::new(NoCaptions, Unreachable);
        let err = pipeline.summarize(&request("dQw4w9WgXcQ")).await.unwrap_err();
        assert!(matches!(err, Error::Transcript(TranscriptError::TranscriptDisabled(_))));
    }

    #[tokio::test]
    async fn test_empty_segments_are_no_transcript() {
        let pipeline = Pipeline::new(EmptyCaptions, Unreachable);
        let err = pipeline.summarize(&request("dQw4w9WgXcQ")).await.unwrap_err();
        assert!(matches!(err, Error::Transcript(TranscriptError::NoTranscript)));
    }
}
