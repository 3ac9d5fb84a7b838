//! The generation client: ordered fallback across model candidates.
//!
//! # Example
//!
//! ```rust,ignore
//! use folio_model::{GenerationClient, GenerationConfig, ContextPassage};
//! use folio_model::openai::OpenAICompatibleBackend;
//!
//! let client = GenerationClient::builder()
//!     .config(GenerationConfig::default())
//!     .candidate(Arc::new(OpenAICompatibleBackend::groq(key.clone(), "llama-3.3-70b-versatile")?))
//!     .candidate(Arc::new(OpenAICompatibleBackend::groq(key, "llama-3.1-8b-instant")?))
//!     .build()?;
//!
//! let result = client.generate("What skills are listed?", &context).await?;
//! println!("{} (served by {})", result.answer, result.served_by);
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::backend::{CompletionRequest, LlmBackend};
use crate::config::GenerationConfig;
use crate::error::{BackendError, CandidateFailure, FailureKind, GenerationError, Result};
use crate::health::{CandidateHealth, CandidateStatus};
use crate::prompt::{ContextPassage, Prompt};

/// A successful generation.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub answer: String,
    /// Identifier of the candidate that produced `answer`.
    pub served_by: String,
    /// Candidates tried or skipped before `served_by`, in priority order.
    pub failed_attempts: Vec<CandidateFailure>,
}

/// Outcome of probing one candidate.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeOutcome {
    pub candidate: String,
    /// `None` when the candidate answered.
    pub failure: Option<CandidateFailure>,
}

/// Sends prompts to a priority-ordered list of model candidates.
///
/// The first candidate that is not cooling down is tried with a bounded
/// timeout. A failure that [falls back](FailureKind::falls_back) marks the
/// candidate failed for the configured cooldown and moves on to the next one;
/// the first success wins. Candidate health lives in a shared
/// [`CandidateHealth`] that every concurrent call reads and updates.
pub struct GenerationClient {
    config: GenerationConfig,
    candidates: Vec<Arc<dyn LlmBackend>>,
    health: Arc<CandidateHealth>,
}

impl GenerationClient {
    /// Create a new [`GenerationClientBuilder`].
    pub fn builder() -> GenerationClientBuilder {
        GenerationClientBuilder::default()
    }

    /// Return a reference to the client configuration.
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// The shared health state.
    pub fn health(&self) -> &Arc<CandidateHealth> {
        &self.health
    }

    /// Status of every candidate, in priority order.
    pub fn candidate_statuses(&self) -> Vec<CandidateStatus> {
        self.health.snapshot()
    }

    /// Answer `query` using only `context`, falling back across candidates.
    ///
    /// # Errors
    ///
    /// - [`GenerationError::Unavailable`] when every candidate failed or was
    ///   cooling down, with one [`CandidateFailure`] per candidate.
    /// - [`GenerationError::Rejected`] when a candidate refused the request
    ///   itself; no further candidates are tried, and earlier failures are
    ///   carried in `attempts`.
    #[instrument(skip_all, fields(query_len = query.len(), context = context.len()))]
    pub async fn generate(&self, query: &str, context: &[ContextPassage]) -> Result<GenerationResult> {
        let request = CompletionRequest {
            prompt: Prompt::grounded(query, context),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let mut failed_attempts = Vec::new();
        for (index, backend) in self.candidates.iter().enumerate() {
            let candidate = backend.model_id();

            if let Err(remaining) = self.health.check_available(index) {
                debug!(candidate, remaining_ms = remaining.as_millis() as u64, "skipping candidate");
                failed_attempts.push(CandidateFailure {
                    candidate: candidate.to_string(),
                    kind: FailureKind::CoolingDown,
                    message: format!("retry in {}s", remaining.as_secs().max(1)),
                });
                continue;
            }

            match self.call(backend.as_ref(), &request).await {
                Ok(answer) => {
                    self.health.mark_healthy(index);
                    info!(candidate, fallbacks = failed_attempts.len(), "generation succeeded");
                    return Ok(GenerationResult {
                        answer,
                        served_by: candidate.to_string(),
                        failed_attempts,
                    });
                }
                Err(e) if e.kind.falls_back() => {
                    warn!(candidate, kind = %e.kind, error = %e.message, "candidate failed, falling back");
                    self.health.mark_failed(index, e.to_string());
                    failed_attempts.push(CandidateFailure {
                        candidate: candidate.to_string(),
                        kind: e.kind,
                        message: e.message,
                    });
                }
                Err(e) => {
                    error!(candidate, error = %e.message, "request rejected");
                    return Err(GenerationError::Rejected {
                        candidate: candidate.to_string(),
                        message: e.message,
                        attempts: failed_attempts,
                    });
                }
            }
        }

        error!(attempts = failed_attempts.len(), "all model candidates unavailable");
        Err(GenerationError::Unavailable { attempts: failed_attempts })
    }

    /// Send a tiny prompt to every candidate, ignoring cooldowns, and record the outcome.
    pub async fn probe(&self) -> Vec<ProbeOutcome> {
        let request = CompletionRequest { prompt: Prompt::probe(), temperature: 0.0, max_tokens: 8 };

        let mut outcomes = Vec::with_capacity(self.candidates.len());
        for (index, backend) in self.candidates.iter().enumerate() {
            let candidate = backend.model_id().to_string();
            let failure = match self.call(backend.as_ref(), &request).await {
                Ok(_) => {
                    self.health.mark_healthy(index);
                    None
                }
                Err(e) => {
                    warn!(candidate = %candidate, error = %e, "probe failed");
                    self.health.mark_failed(index, e.to_string());
                    Some(CandidateFailure { candidate: candidate.clone(), kind: e.kind, message: e.message })
                }
            };
            outcomes.push(ProbeOutcome { candidate, failure });
        }
        outcomes
    }

    async fn call(
        &self,
        backend: &dyn LlmBackend,
        request: &CompletionRequest,
    ) -> std::result::Result<String, BackendError> {
        let timeout = self.config.timeout;
        let text = match tokio::time::timeout(timeout, backend.complete(request)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(BackendError::new(
                    FailureKind::Timeout,
                    format!("no response within {}ms", timeout.as_millis()),
                ));
            }
        };
        let text = text.trim();
        if text.is_empty() {
            return Err(BackendError::new(FailureKind::InvalidResponse, "empty completion"));
        }
        Ok(text.to_string())
    }
}

/// Builder for constructing a [`GenerationClient`].
///
/// Candidates are tried in the order they are added.
#[derive(Default)]
pub struct GenerationClientBuilder {
    config: Option<GenerationConfig>,
    candidates: Vec<Arc<dyn LlmBackend>>,
}

impl GenerationClientBuilder {
    /// Set the client configuration.
    pub fn config(mut self, config: GenerationConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Append a candidate at the lowest priority so far.
    pub fn candidate(mut self, backend: Arc<dyn LlmBackend>) -> Self {
        self.candidates.push(backend);
        self
    }

    /// Append several candidates, keeping their order.
    pub fn candidates(mut self, backends: impl IntoIterator<Item = Arc<dyn LlmBackend>>) -> Self {
        self.candidates.extend(backends);
        self
    }

    /// Build the [`GenerationClient`].
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::ConfigError`] if there are no candidates or a
    /// candidate has a blank model identifier.
    pub fn build(self) -> Result<GenerationClient> {
        if self.candidates.is_empty() {
            return Err(GenerationError::ConfigError("at least one candidate is required".into()));
        }
        if self.candidates.iter().any(|c| c.model_id().trim().is_empty()) {
            return Err(GenerationError::ConfigError("candidate model id must not be empty".into()));
        }
        let config = self.config.unwrap_or_default();
        let ids = self.candidates.iter().map(|c| c.model_id().to_string()).collect();
        let health = Arc::new(CandidateHealth::new(ids, config.cooldown));

        Ok(GenerationClient { config, candidates: self.candidates, health })
    }
}
