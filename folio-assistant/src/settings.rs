//! Process settings read from the environment.
//!
//! Only the launcher reads the environment; library types take explicit
//! configuration. Call `dotenvy::dotenv()` first to pick up a `.env` file.

use std::path::PathBuf;

use crate::error::{AssistantError, Result};
use crate::telemetry::LogFormat;

/// Model candidates used when `FOLIO_MODELS` is unset, in priority order.
pub const DEFAULT_MODELS: &[&str] = &["llama-3.3-70b-versatile", "llama-3.1-8b-instant"];

/// Portfolio file used when `FOLIO_PORTFOLIO_PATH` is unset.
pub const DEFAULT_PORTFOLIO_PATH: &str = "data/portfolio.txt";

/// Everything the launcher needs to assemble a [`PortfolioAssistant`](crate::PortfolioAssistant).
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    /// `GROQ_API_KEY`, required.
    pub api_key: String,
    /// `FOLIO_MODELS`, comma-separated, highest priority first.
    pub models: Vec<String>,
    /// `FOLIO_LLM_BASE_URL`; `None` means the Groq endpoint.
    pub llm_base_url: Option<String>,
    /// `FOLIO_EMBEDDING_MODEL`; `None` means the embedder's default model.
    pub embedding_model: Option<String>,
    /// `FOLIO_PORTFOLIO_PATH`.
    pub portfolio_path: PathBuf,
    /// `FOLIO_LOG_FORMAT`, `text` or `json`.
    pub log_format: LogFormat,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("models", &self.models)
            .field("llm_base_url", &self.llm_base_url)
            .field("embedding_model", &self.embedding_model)
            .field("portfolio_path", &self.portfolio_path)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::ConfigError`] if `GROQ_API_KEY` is missing or
    /// a value is malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = var("GROQ_API_KEY")
            .ok_or_else(|| AssistantError::ConfigError("GROQ_API_KEY is not set".into()))?;

        let models = match var("FOLIO_MODELS") {
            Some(list) => parse_models(&list)?,
            None => DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
        };

        let log_format = match var("FOLIO_LOG_FORMAT") {
            Some(value) => LogFormat::parse(&value).ok_or_else(|| {
                AssistantError::ConfigError(format!("FOLIO_LOG_FORMAT must be text or json, got '{value}'"))
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            api_key,
            models,
            llm_base_url: var("FOLIO_LLM_BASE_URL"),
            embedding_model: var("FOLIO_EMBEDDING_MODEL"),
            portfolio_path: var("FOLIO_PORTFOLIO_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PORTFOLIO_PATH)),
            log_format,
        })
    }
}

fn parse_models(list: &str) -> Result<Vec<String>> {
    let models: Vec<String> =
        list.split(',').map(str::trim).filter(|m| !m.is_empty()).map(String::from).collect();
    if models.is_empty() {
        return Err(AssistantError::ConfigError("FOLIO_MODELS lists no models".into()));
    }
    Ok(models)
}
