//! The [`LlmBackend`] trait implemented by every model candidate.

use async_trait::async_trait;

use crate::error::BackendError;
use crate::prompt::Prompt;

/// One non-streaming completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: Prompt,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A language-model endpoint that can complete a prompt.
///
/// Backends classify their failures with a [`FailureKind`](crate::FailureKind)
/// so the generation client can decide whether to fall back to the next
/// candidate. Timeouts are enforced by the caller as well, so a backend that
/// never returns cannot stall generation.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// The model identifier, used as the candidate id.
    fn model_id(&self) -> &str;

    /// Produce the answer text for `request`.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError>;
}
