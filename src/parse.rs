use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub const UNTITLED: &str = "Untitled";

static STEPS_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)Actionable Steps:|^[ \t]*(?:#{1,6}[ \t]*)?(?:\*\*)?Action Steps(?:\*\*)?:?(?:\*\*)?[ \t]*$")
        .expect("valid regex")
});

static ORDINAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\s*").expect("valid regex"));

static TITLE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    // A trailing title needs the colon; without one the heading must stand alone on its line
    Regex::new(r"(?m)^[ \t]*(?:#{1,6}[ \t]*)?(?:\*\*)?Title(?:\*\*)?(?::(?:\*\*)?[ \t]*(.*)|[ \t]*)$")
        .expect("valid regex")
});

static SUMMARY_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:#{1,6}[ \t]*)?(?:\*\*)?Summary(?:\*\*)?:?(?:\*\*)?[ \t]*$").expect("valid regex")
});

/// Model output split at the action-steps marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedSummary {
    pub content: String,
    pub action_steps: Vec<String>,
}

/// Structured view of a generated summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    pub title: String,
    pub summary: String,
    pub content: String,
    pub action_steps: Vec<String>,
}

/// Split raw markdown into content and action steps; a missing marker is not an error.
pub fn parse_summary(raw: &str) -> ParsedSummary {
    let Some(marker) = STEPS_MARKER.find(raw) else {
        return ParsedSummary {
            content: raw.trim().to_string(),
            action_steps: Vec::new(),
        };
    };

    let action_steps = raw[marker.end()..]
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| ORDINAL.replace(line, "").trim().to_string())
        .filter(|step| !step.is_empty())
        .collect();

    ParsedSummary {
        content: raw[..marker.start()].trim().to_string(),
        action_steps,
    }
}

pub fn parse_result(raw: &str) -> GenerationResult {
    let ParsedSummary { content, action_steps } = parse_summary(raw);

    GenerationResult {
        title: extract_title(&content).unwrap_or_else(|| UNTITLED.to_string()),
        summary: extract_section_body(&content).unwrap_or_else(|| content.clone()),
        content,
        action_steps,
    }
}

fn extract_title(content: &str) -> Option<String> {
    let caps = TITLE_HEADING.captures(content)?;
    let inline = clean_heading_text(caps.get(1).map_or("", |m| m.as_str()));
    if !inline.is_empty() {
        return Some(inline);
    }

    let rest = &content[caps.get(0)?.end()..];
    rest.lines()
        .map(clean_heading_text)
        .find(|line| !line.is_empty())
        .filter(|line| !line.starts_with('#'))
}

fn extract_section_body(content: &str) -> Option<String> {
    let heading = SUMMARY_HEADING.find(content)?;
    let body = content[heading.end()..]
        .lines()
        .take_while(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n");
    let body = body.trim();
    (!body.is_empty()).then(|| body.to_string())
}

fn clean_heading_text(text: &str) -> String {
    text.trim().trim_matches('*').trim().to_string()
}
