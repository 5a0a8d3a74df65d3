use async_trait::async_trait;
use log::{debug, info};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT_LANGUAGE, USER_AGENT};
use serde::Deserialize;

use crate::{TranscriptError, TranscriptSegment, VideoId, resolve_video_id};

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const CAPTIONS_MARKER: &str = "\"captions\":";
const CAPTIONS_END_MARKER: &str = ",\"videoDetails";
const CAPTCHA_MARKER: &str = "class=\"g-recaptcha\"";
const PLAYABILITY_MARKER: &str = "\"playabilityStatus\":";

type Result<T> = std::result::Result<T, TranscriptError>;

/// Anything that can produce caption segments for a video
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch_segments(&self, video_id: &VideoId, lang: Option<&str>) -> Result<Vec<TranscriptSegment>>;
}

#[async_trait]
impl<T: TranscriptSource + ?Sized> TranscriptSource for Box<T> {
    async fn fetch_segments(&self, video_id: &VideoId, lang: Option<&str>) -> Result<Vec<TranscriptSegment>> {
        (**self).fetch_segments(video_id, lang).await
    }
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    #[serde(rename = "languageCode")]
    pub language_code: String,
}

/// Resolve a URL or bare ID, then pull its segments from `source`
pub async fn fetch_transcript<S>(source: &S, input: &str, lang: Option<&str>) -> Result<Vec<TranscriptSegment>>
where
    S: TranscriptSource + ?Sized,
{
    let video_id = resolve_video_id(input)?;
    source.fetch_segments(&video_id, lang).await
}

/// Scrapes the caption tracks embedded in the YouTube watch page
#[derive(Debug, Clone)]
pub struct YouTubeCaptions {
    client: reqwest::Client,
}

impl YouTubeCaptions {
    /// `client` should carry the per-call timeout
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn get(&self, url: &str, lang: Option<&str>) -> reqwest::RequestBuilder {
        let req = self.client.get(url).header(USER_AGENT, BROWSER_USER_AGENT);
        match lang {
            Some(lang) => req.header(ACCEPT_LANGUAGE, lang),
            None => req,
        }
    }
}

#[async_trait]
impl TranscriptSource for YouTubeCaptions {
    async fn fetch_segments(&self, video_id: &VideoId, lang: Option<&str>) -> Result<Vec<TranscriptSegment>> {
        let watch_url = video_id.watch_url();
        debug!("Fetching watch page: {watch_url}");

        let resp = self.get(&watch_url, lang).send().await?;
        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(TranscriptError::RateLimited(video_id.clone()));
        }
        let page_html = resp.text().await?;

        let tracks = parse_watch_page(&page_html, video_id)?;
        let track = select_track(&tracks, lang, video_id)?;
        debug!("Using caption track: lang={}", track.language_code);

        let resp = self.get(&track.base_url, lang).send().await?;
        if !resp.status().is_success() {
            debug!("Caption payload returned {}", resp.status());
            return Err(TranscriptError::TranscriptNotAvailable(video_id.clone()));
        }
        let caption_xml = resp.text().await?;

        let segments = parse_caption_xml(&caption_xml, &track.language_code)?;
        if segments.is_empty() {
            return Err(TranscriptError::Empty(video_id.clone()));
        }

        info!("Fetched {} caption segments for {video_id}", segments.len());
        Ok(segments)
    }
}

/// Pull the caption track list out of the watch page's inline player payload
pub fn parse_watch_page(html: &str, video_id: &VideoId) -> Result<Vec<CaptionTrack>> {
    let Some((_, after)) = html.split_once(CAPTIONS_MARKER) else {
        if html.contains(CAPTCHA_MARKER) {
            return Err(TranscriptError::RateLimited(video_id.clone()));
        }
        if !html.contains(PLAYABILITY_MARKER) {
            return Err(TranscriptError::VideoUnavailable(video_id.clone()));
        }
        return Err(TranscriptError::TranscriptDisabled(video_id.clone()));
    };

    let json = after
        .split_once(CAPTIONS_END_MARKER)
        .map(|(json, _)| json)
        .unwrap_or(after);

    // Take the first JSON value and ignore whatever page text trails it
    let captions = match serde_json::Deserializer::from_str(json)
        .into_iter::<CaptionsData>()
        .next()
    {
        Some(Ok(captions)) => captions,
        Some(Err(e)) => {
            debug!("Captions JSON did not parse: {e}");
            return Err(TranscriptError::TranscriptDisabled(video_id.clone()));
        }
        None => return Err(TranscriptError::TranscriptDisabled(video_id.clone())),
    };

    let renderer = captions
        .player_captions_tracklist_renderer
        .ok_or_else(|| TranscriptError::TranscriptDisabled(video_id.clone()))?;

    let tracks = renderer.caption_tracks.unwrap_or_default();
    if tracks.is_empty() {
        return Err(TranscriptError::TranscriptNotAvailable(video_id.clone()));
    }

    Ok(tracks)
}

/// Pick the requested language, or the first track when none was asked for
pub fn select_track<'a>(tracks: &'a [CaptionTrack], lang: Option<&str>, video_id: &VideoId) -> Result<&'a CaptionTrack> {
    match lang {
        Some(lang) => tracks
            .iter()
            .find(|t| t.language_code == lang)
            .ok_or_else(|| TranscriptError::LanguageNotAvailable {
                video_id: video_id.clone(),
                lang: lang.to_string(),
                available: tracks.iter().map(|t| t.language_code.clone()).collect(),
            }),
        None => tracks
            .first()
            .ok_or_else(|| TranscriptError::TranscriptNotAvailable(video_id.clone())),
    }
}

/// Parse the timedtext payload: `<text start=".." dur="..">content</text>`
pub fn parse_caption_xml(xml: &str, lang: &str) -> Result<Vec<TranscriptSegment>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    // (start, dur, text) of the <text> element being read
    let mut pending: Option<(f64, f64, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                let mut start = 0.0;
                let mut dur = 0.0;
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value);
                    match attr.key.as_ref() {
                        b"start" => start = value.parse::<f64>().unwrap_or(0.0),
                        b"dur" => dur = value.parse::<f64>().unwrap_or(0.0),
                        _ => {}
                    }
                }
                pending = Some((start, dur, String::new()));
            }
            Ok(Event::Text(ref e)) => {
                if let Some((_, _, ref mut text)) = pending {
                    // HTML entities such as &nbsp; are not XML; keep the raw text for html_escape
                    let raw_text = match e.unescape() {
                        Ok(unescaped) => unescaped.into_owned(),
                        Err(err) => {
                            debug!("Keeping raw caption text ({err})");
                            String::from_utf8_lossy(e).into_owned()
                        }
                    };
                    text.push_str(&html_escape::decode_html_entities(&raw_text));
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"text" => {
                if let Some((offset, duration, text)) = pending.take() {
                    segments.push(TranscriptSegment {
                        text,
                        offset,
                        duration,
                        lang: lang.to_string(),
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(TranscriptError::CaptionParse(e.to_string())),
            _ => {}
        }
    }

    Ok(segments)
}
