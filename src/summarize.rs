use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::llm::{ChatModel, Message};
use crate::{GenerationError, ModelError};

/// Tokens set aside for the fixed system and instruction text
pub const PROMPT_RESERVE_TOKENS: usize = 500;

pub const TRUNCATION_NOTICE: &str = "\n\n[Transcript truncated to fit the model's context window]";

const SAFETY_MARGIN: f64 = 0.9;
const QUICK_MAX_RATIO: f64 = 0.5;

/// Subscription level, gating model candidates and request allowance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanTier {
    #[default]
    Basic,
    Plus,
    Pro,
}

impl PlanTier {
    /// Unpaid accounts are served as Basic whatever their nominal tier
    pub fn effective(self, has_paid: bool) -> PlanTier {
        if has_paid { self } else { PlanTier::Basic }
    }

    pub fn requests_per_minute(self) -> u32 {
        match self {
            PlanTier::Basic | PlanTier::Plus => 10,
            PlanTier::Pro => 60,
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanTier::Basic => write!(f, "Basic"),
            PlanTier::Plus => write!(f, "Plus"),
            PlanTier::Pro => write!(f, "Pro"),
        }
    }
}

impl FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(PlanTier::Basic),
            "plus" => Ok(PlanTier::Plus),
            "pro" => Ok(PlanTier::Pro),
            other => Err(format!("unknown plan tier '{other}' (expected Basic, Plus or Pro)")),
        }
    }
}

/// One candidate backend and its context budget in tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    pub id: &'static str,
    pub token_limit: usize,
}

pub const FAST_MODEL: ModelSpec = ModelSpec {
    id: "llama-3.1-8b-instant",
    token_limit: 6_000,
};

pub const BALANCED_MODEL: ModelSpec = ModelSpec {
    id: "llama-3.3-70b-versatile",
    token_limit: 12_000,
};

pub const BEST_MODEL: ModelSpec = ModelSpec {
    id: "openai/gpt-oss-120b",
    token_limit: 30_000,
};

const BASIC_MODELS: &[ModelSpec] = &[FAST_MODEL];
const PLUS_MODELS: &[ModelSpec] = &[BALANCED_MODEL, FAST_MODEL];
const PRO_MODELS: &[ModelSpec] = &[BEST_MODEL, BALANCED_MODEL, FAST_MODEL];
const QUICK_MODELS: &[ModelSpec] = &[FAST_MODEL];

/// Candidates in fallback order, most capable first
pub fn candidates(tier: PlanTier, quick: bool) -> &'static [ModelSpec] {
    if quick {
        return QUICK_MODELS;
    }
    match tier {
        PlanTier::Basic => BASIC_MODELS,
        PlanTier::Plus => PLUS_MODELS,
        PlanTier::Pro => PRO_MODELS,
    }
}

/// Coarse estimate: one token per four characters
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Cut the transcript down to what fits `token_limit`; quick mode always keeps at most half
pub fn fit_transcript(transcript: &str, token_limit: usize, quick: bool) -> Cow<'_, str> {
    let available = token_limit.saturating_sub(PROMPT_RESERVE_TOKENS);
    let estimated = estimate_tokens(transcript);

    if estimated == 0 || (estimated <= available && !quick) {
        return Cow::Borrowed(transcript);
    }

    let mut ratio = available as f64 / estimated as f64;
    if quick {
        ratio = ratio.min(QUICK_MAX_RATIO);
    }
    let ratio = ratio.min(1.0) * SAFETY_MARGIN;

    let total_chars = transcript.chars().count();
    let keep = (total_chars as f64 * ratio).floor() as usize;
    let cut = transcript
        .char_indices()
        .nth(keep)
        .map(|(i, _)| i)
        .unwrap_or(transcript.len());

    debug!("Truncating transcript from {total_chars} to {keep} chars (budget {available} tokens)");
    Cow::Owned(format!("{}{TRUNCATION_NOTICE}", &transcript[..cut]))
}

const QUICK_SYSTEM_PROMPT: &str = "You summarize YouTube video transcripts quickly. \
Always answer in English, whatever the transcript's language. \
Be brief: a short summary paragraph and exactly three short action steps. \
Keep a neutral, practical tone.";

const DETAILED_SYSTEM_PROMPT: &str = "You are an expert analyst who turns YouTube video transcripts into thorough, \
well-structured summaries. Always answer in English, whatever the transcript's language. \
Cover the key points, arguments and important details, and give concrete, actionable steps with examples. \
Keep a clear, professional tone.";

const QUICK_PROMPT: &str = "Summarize the following video transcript. Respond in English using exactly this markdown structure:

## Title:
<a short descriptive title>

## Summary:
<two or three sentences>

## Action Steps:
1. <short step>
2. <short step>
3. <short step>

Transcript:
";

const DETAILED_PROMPT: &str = "Summarize the following video transcript in depth. Respond in English using exactly this markdown structure:

## Title:
<a descriptive title>

## Summary:
<a detailed summary covering the main ideas, arguments and conclusions>

## Action Steps:
1. <a thorough, actionable step with a concrete example>
2. <continue the numbered list with as many steps as the content supports>

Transcript:
";

const CHAT_SYSTEM_PROMPT: &str = "You answer questions about a YouTube video using only its transcript below. \
Always answer in English. If the transcript does not cover the question, say so plainly.

Transcript:
";

/// System and user messages for one summary request
pub fn build_messages(transcript: &str, quick: bool) -> Vec<Message> {
    let (system, prompt) = if quick {
        (QUICK_SYSTEM_PROMPT, QUICK_PROMPT)
    } else {
        (DETAILED_SYSTEM_PROMPT, DETAILED_PROMPT)
    };
    vec![Message::system(system), Message::user(format!("{prompt}{transcript}"))]
}

fn build_chat_messages(transcript: &str, history: &[Message], question: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(format!("{CHAT_SYSTEM_PROMPT}{transcript}")));
    messages.extend(history.iter().cloned());
    messages.push(Message::user(question));
    messages
}

const RECOVERABLE_SIGNATURES: &[&str] = &[
    "rate limit",
    "rate_limit",
    "ratelimit",
    "capacity",
    "request too large",
    "request_too_large",
    "tokens per minute",
];

/// Capacity and throttling failures are worth a cheaper model; anything else is not
pub fn is_recoverable(err: &ModelError) -> bool {
    if err.status == Some(429) {
        return true;
    }
    let message = err.message.to_ascii_lowercase();
    RECOVERABLE_SIGNATURES.iter().any(|sig| message.contains(sig))
}

/// Tiered summary generation over an injected model client
pub struct Summarizer<M> {
    model: M,
}

impl<M: ChatModel> Summarizer<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Summarize `transcript` into raw markdown using the tier's candidates
    pub async fn generate(&self, transcript: &str, tier: PlanTier, quick: bool) -> Result<String, GenerationError> {
        self.generate_with(candidates(tier, quick), transcript, quick).await
    }

    pub async fn generate_with(
        &self,
        models: &[ModelSpec],
        transcript: &str,
        quick: bool,
    ) -> Result<String, GenerationError> {
        self.run(models, |spec| {
            let fitted = fit_transcript(transcript, spec.token_limit, quick);
            build_messages(&fitted, quick)
        })
        .await
    }

    /// Answer a follow-up question about the video
    pub async fn chat(
        &self,
        transcript: &str,
        history: &[Message],
        question: &str,
        tier: PlanTier,
    ) -> Result<String, GenerationError> {
        // History and question share the model's window with the transcript
        let conversation_tokens =
            history.iter().map(|m| estimate_tokens(&m.content)).sum::<usize>() + estimate_tokens(question);

        self.run(candidates(tier, false), |spec| {
            let budget = spec.token_limit.saturating_sub(conversation_tokens);
            let fitted = fit_transcript(transcript, budget, false);
            build_chat_messages(&fitted, history, question)
        })
        .await
    }

    async fn run<F>(&self, models: &[ModelSpec], build: F) -> Result<String, GenerationError>
    where
        F: Fn(&ModelSpec) -> Vec<Message>,
    {
        let mut last_err = None;

        for (i, spec) in models.iter().enumerate() {
            let messages = build(spec);
            info!("Generating with {} ({} of {})", spec.id, i + 1, models.len());

            match self.model.complete(spec.id, &messages).await {
                Ok(text) => return Ok(text),
                Err(e) if !is_recoverable(&e) => return Err(GenerationError::Model(e)),
                Err(e) => {
                    warn!("{} unavailable: {e}", spec.id);
                    last_err = Some(e);
                }
            }
        }

        match last_err {
            Some(last) => Err(GenerationError::ModelsExhausted { last }),
            None => Err(GenerationError::NoCandidates),
        }
    }
}
