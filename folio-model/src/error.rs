//! Error types for the `folio-model` crate.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Why a single call to a model backend failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The call did not finish within the configured timeout.
    Timeout,
    /// The provider throttled the request.
    RateLimited,
    /// Transient service trouble: 5xx, connection failure, unknown model.
    Unavailable,
    /// Credentials for this candidate were refused.
    Unauthorized,
    /// The provider answered with something that is not a usable completion.
    InvalidResponse,
    /// The candidate was skipped because it is inside its failure cooldown.
    CoolingDown,
    /// The request itself was refused (malformed, too long). Another candidate would refuse it too.
    Rejected,
}

impl FailureKind {
    /// Whether the fallback chain should move on to the next candidate.
    pub fn falls_back(self) -> bool {
        !matches!(self, FailureKind::Rejected)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Timeout => "timeout",
            FailureKind::RateLimited => "rate limited",
            FailureKind::Unavailable => "unavailable",
            FailureKind::Unauthorized => "unauthorized",
            FailureKind::InvalidResponse => "invalid response",
            FailureKind::CoolingDown => "cooling down",
            FailureKind::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

/// A failure reported by an [`LlmBackend`](crate::LlmBackend).
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct BackendError {
    pub kind: FailureKind,
    pub message: String,
}

impl BackendError {
    /// Create a backend error of the given kind.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

/// One candidate's failure inside a fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateFailure {
    /// The model identifier of the candidate.
    pub candidate: String,
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for CandidateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}: {})", self.candidate, self.kind, self.message)
    }
}

fn list_attempts(attempts: &[CandidateFailure]) -> String {
    attempts.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Errors returned by the generation client.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Every candidate failed or was cooling down. One entry per candidate, in priority order.
    #[error("All model candidates unavailable: {}", list_attempts(.attempts))]
    Unavailable { attempts: Vec<CandidateFailure> },

    /// A candidate refused the request itself; trying other candidates would not help.
    ///
    /// `attempts` lists the candidates tried or skipped before it, in priority order.
    #[error("Request rejected by {candidate}: {message}")]
    Rejected { candidate: String, message: String, attempts: Vec<CandidateFailure> },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// A convenience result type for generation operations.
pub type Result<T> = std::result::Result<T, GenerationError>;
