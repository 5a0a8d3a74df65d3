use std::path::{Path, PathBuf};

use async_trait::async_trait;
use eyre::Result;
use log::{debug, warn};

use crate::youtube::TranscriptSource;
use crate::{TranscriptError, TranscriptSegment, VideoId};

pub fn default_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("tubesum")
        .join("transcripts")
}

/// The language code is caller input; only `[A-Za-z0-9_-]` reaches the file name
fn cache_path(dir: &Path, video_id: &VideoId, lang: Option<&str>) -> PathBuf {
    let lang: String = match lang {
        Some(lang) => lang
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect(),
        None => "default".to_string(),
    };
    dir.join(format!("{video_id}-{lang}.json"))
}

/// Load cached segments, if available.
pub fn load(dir: &Path, video_id: &VideoId, lang: Option<&str>) -> Option<Vec<TranscriptSegment>> {
    let path = cache_path(dir, video_id, lang);
    let data = std::fs::read_to_string(&path).ok()?;
    let segments: Vec<TranscriptSegment> = serde_json::from_str(&data).ok()?;
    debug!("Cache hit: {}", path.display());
    Some(segments)
}

/// Save segments to the cache.
pub fn save(dir: &Path, video_id: &VideoId, lang: Option<&str>, segments: &[TranscriptSegment]) -> Result<()> {
    let path = cache_path(dir, video_id, lang);
    std::fs::create_dir_all(dir)?;
    let data = serde_json::to_string_pretty(segments)?;
    std::fs::write(&path, data)?;
    debug!("Cached transcript: {}", path.display());
    Ok(())
}

/// Serves segments from disk when present, otherwise asks `inner` and stores the result
pub struct CachedSource<S> {
    inner: S,
    dir: PathBuf,
}

impl<S> CachedSource<S> {
    pub fn new(inner: S, dir: impl Into<PathBuf>) -> Self {
        Self { inner, dir: dir.into() }
    }
}

#[async_trait]
impl<S: TranscriptSource> TranscriptSource for CachedSource<S> {
    async fn fetch_segments(
        &self,
        video_id: &VideoId,
        lang: Option<&str>,
    ) -> std::result::Result<Vec<TranscriptSegment>, TranscriptError> {
        if let Some(segments) = load(&self.dir, video_id, lang) {
            return Ok(segments);
        }

        let segments = self.inner.fetch_segments(video_id, lang).await?;
        if let Err(e) = save(&self.dir, video_id, lang, &segments) {
            warn!("Failed to cache transcript for {video_id}: {e}");
        }
        Ok(segments)
    }
}
