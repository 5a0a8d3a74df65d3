use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{GenerationError, ModelError};

pub const DEFAULT_API_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A chat-completion backend addressed by model identifier
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, model: &str, messages: &[Message]) -> Result<String, ModelError>;
}

/// One client handle can back many pipelines
#[async_trait]
impl<T: ChatModel + ?Sized> ChatModel for std::sync::Arc<T> {
    async fn complete(&self, model: &str, messages: &[Message]) -> Result<String, ModelError> {
        (**self).complete(model, messages).await
    }
}

/// OpenAI-compatible `/chat/completions` client
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    max_tokens: u32,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OpenAiClient {
    /// Fails fast when the credential is missing; no request is ever sent without one.
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        api_key: Option<&str>,
        max_tokens: u32,
    ) -> Result<Self, GenerationError> {
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| GenerationError::NotConfigured(format!("LLM API key (set api_key or {API_KEY_ENV})")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            max_tokens,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, model: &str, messages: &[Message]) -> Result<String, ModelError> {
        debug!("Requesting completion from {model} ({} messages)", messages.len());

        let body = serde_json::json!({
            "model": model,
            "max_tokens": self.max_tokens,
            "messages": messages,
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::new(model, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("{model} returned {status}");
            return Err(ModelError::new(model, api_error_message(&body)).with_status(status.as_u16()));
        }

        let json: serde_json::Value = resp.json().await.map_err(|e| ModelError::new(model, e.to_string()))?;
        extract_openai_text(&json).ok_or_else(|| ModelError::new(model, "unexpected chat completion response format"))
    }
}

/// Prefer the provider's `error.message`, fall back to the raw body
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_openai_text(json: &serde_json::Value) -> Option<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .map(|t| t.to_string())
}
