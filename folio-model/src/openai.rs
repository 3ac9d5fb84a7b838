//! OpenAI-compatible chat completion backend (OpenAI, Groq, vLLM, Ollama, ...).
//!
//! This module is only available when the `openai` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::{CompletionRequest, LlmBackend};
use crate::error::{BackendError, FailureKind, GenerationError, Result};

/// Groq's OpenAI-compatible API base.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

/// OpenAI's API base.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Connection settings for one candidate.
#[derive(Debug, Clone)]
pub struct OpenAICompatibleConfig {
    pub api_key: String,
    /// API base without the trailing `/chat/completions`.
    pub base_url: String,
    pub model: String,
    /// HTTP-level request timeout. The generation client applies its own as well.
    pub request_timeout: Duration,
}

impl OpenAICompatibleConfig {
    /// Settings for a Groq-hosted model.
    pub fn groq(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::compatible(api_key, GROQ_API_BASE, model)
    }

    /// Settings for any OpenAI-compatible server.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Set the HTTP request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// An [`LlmBackend`] speaking the `/chat/completions` protocol.
pub struct OpenAICompatibleBackend {
    client: reqwest::Client,
    config: OpenAICompatibleConfig,
}

impl OpenAICompatibleBackend {
    /// Create a backend from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::ConfigError`] for a blank API key or model,
    /// or if the HTTP client cannot be built.
    pub fn new(config: OpenAICompatibleConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(GenerationError::ConfigError(format!(
                "API key for '{}' must not be empty",
                config.model
            )));
        }
        if config.model.trim().is_empty() {
            return Err(GenerationError::ConfigError("model must not be empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GenerationError::ConfigError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Create a backend for a Groq-hosted model.
    pub fn groq(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::new(OpenAICompatibleConfig::groq(api_key, model))
    }
}

// ── Chat completion request/response types ─────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Map an HTTP error status onto a failure kind.
pub fn classify_status(status: u16) -> FailureKind {
    match status {
        408 => FailureKind::Timeout,
        429 => FailureKind::RateLimited,
        401 | 403 => FailureKind::Unauthorized,
        // Unknown or decommissioned model: another candidate may still serve.
        404 => FailureKind::Unavailable,
        400..=499 => FailureKind::Rejected,
        _ => FailureKind::Unavailable,
    }
}

fn classify_transport(err: &reqwest::Error) -> FailureKind {
    if err.is_timeout() { FailureKind::Timeout } else { FailureKind::Unavailable }
}

#[async_trait]
impl LlmBackend for OpenAICompatibleBackend {
    fn model_id(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, request: &CompletionRequest) -> std::result::Result<String, BackendError> {
        debug!(model = %self.config.model, "sending chat completion");

        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage { role: "system", content: &request.prompt.system },
                ChatMessage { role: "user", content: &request.prompt.user },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::new(classify_transport(&e), format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail =
                serde_json::from_str::<ErrorResponse>(&text).map(|e| e.error.message).unwrap_or(text);
            return Err(BackendError::new(
                classify_status(status.as_u16()),
                format!("API returned {status}: {detail}"),
            ));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            BackendError::new(FailureKind::InvalidResponse, format!("failed to parse response: {e}"))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| BackendError::new(FailureKind::InvalidResponse, "response had no content"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_map_to_failure_kinds() {
        assert_eq!(classify_status(429), FailureKind::RateLimited);
        assert_eq!(classify_status(408), FailureKind::Timeout);
        assert_eq!(classify_status(401), FailureKind::Unauthorized);
        assert_eq!(classify_status(404), FailureKind::Unavailable);
        assert_eq!(classify_status(400), FailureKind::Rejected);
        assert_eq!(classify_status(413), FailureKind::Rejected);
        assert_eq!(classify_status(503), FailureKind::Unavailable);
    }

    #[test]
    fn blank_key_is_a_config_error() {
        let result = OpenAICompatibleBackend::groq("  ", "llama-3.1-8b-instant");
        assert!(matches!(result, Err(GenerationError::ConfigError(_))));
    }

    #[test]
    fn groq_config_uses_groq_base() {
        let config = OpenAICompatibleConfig::groq("key", "llama-3.1-8b-instant");
        assert_eq!(config.base_url, GROQ_API_BASE);
    }

    #[test]
    fn request_serializes_as_chat_completion() {
        let body = ChatRequest {
            model: "m",
            messages: [
                ChatMessage { role: "system", content: "s" },
                ChatMessage { role: "user", content: "u" },
            ],
            temperature: 0.3,
            max_tokens: 256,
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["max_tokens"], 256);
        assert_eq!(json["stream"], false);
    }
}
