use crate::TranscriptSegment;
use crate::pipeline::SummaryReport;

/// Render a summary as markdown
pub fn render_summary_text(report: &SummaryReport) -> String {
    let mut out = format!("# {}\n\n{}\n", report.title, report.summary);

    if !report.action_steps.is_empty() {
        out.push_str("\n## Action Steps\n\n");
        for (i, step) in report.action_steps.iter().enumerate() {
            out.push_str(&format!("{}. {step}\n", i + 1));
        }
    }

    out
}

pub fn render_summary_json(report: &SummaryReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_default()
}

/// Render transcript as plain text (one segment per line, no timestamps)
pub fn render_text(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_json(segments: &[TranscriptSegment]) -> String {
    serde_json::to_string_pretty(segments).unwrap_or_default()
}

pub fn render_srt(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "{}\n{} --> {}\n{}\n",
                i + 1,
                srt_timestamp(s.offset),
                srt_timestamp(s.offset + s.duration),
                s.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn srt_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let (h, rem) = (total_ms / 3_600_000, total_ms % 3_600_000);
    let (m, rem) = (rem / 60_000, rem % 60_000);
    let (s, ms) = (rem / 1000, rem % 1000);
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VideoId;

    fn sample_segments() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment {
                text: "Hello world".to_string(),
                offset: 0.0,
                duration: 1.5,
                lang: "en".to_string(),
            },
            TranscriptSegment {
                text: "This is a test".to_string(),
                offset: 61.5,
                duration: 2.25,
                lang: "en".to_string(),
            },
        ]
    }

    fn sample_report(action_steps: Vec<String>) -> SummaryReport {
        SummaryReport {
            video_id: VideoId::parse("dQw4w9WgXcQ").unwrap(),
            title: "Test Video".to_string(),
            summary: "A test video.".to_string(),
            content: "## Title:\nTest Video\n\n## Summary:\nA test video.".to_string(),
            action_steps,
            transcript: "Hello world This is a test".to_string(),
        }
    }

    #[test]
    fn test_render_text() {
        assert_eq!(render_text(&sample_segments()), "Hello world\nThis is a test");
    }

    #[test]
    fn test_render_text_empty() {
        assert_eq!(render_text(&[]), "");
    }

    #[test]
    fn test_render_srt() {
        let srt = render_srt(&sample_segments());
        assert_eq!(
            srt,
            "1\n00:00:00,000 --> 00:00:01,500\nHello world\n\n2\n00:01:01,500 --> 00:01:03,750\nThis is a test\n"
        );
    }

    #[test]
    fn test_render_summary_text() {
        let out = render_summary_text(&sample_report(vec!["Try it".to_string(), "Share it".to_string()]));
        assert!(out.starts_with("# Test Video\n\nA test video.\n"));
        assert!(out.contains("1. Try it\n2. Share it\n"));
    }

    #[test]
    fn test_render_summary_text_without_steps() {
        let out = render_summary_text(&sample_report(vec![]));
        assert!(!out.contains("Action Steps"));
    }

    #[test]
    fn test_render_summary_json() {
        let json: serde_json::Value = serde_json::from_str(&render_summary_json(&sample_report(vec![]))).unwrap();
        assert_eq!(json["video_id"], "dQw4w9WgXcQ");
        assert_eq!(json["title"], "Test Video");
        assert!(json["action_steps"].as_array().unwrap().is_empty());
    }
}
