//! Error types for the `folio-assistant` crate.

use folio_model::GenerationError;
use folio_rag::RagError;
use thiserror::Error;

/// Errors surfaced by [`PortfolioAssistant`](crate::PortfolioAssistant).
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Embedding, indexing, ingestion or retrieval failed.
    #[error(transparent)]
    Rag(#[from] RagError),

    /// Every model candidate failed, or a candidate rejected the request.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// The question is blank or too long.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// No portfolio has been ingested, so there is nothing to answer from.
    #[error("Portfolio index is empty; ingest a document first")]
    NotReady,

    /// Missing or malformed settings.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// A convenience result type for assistant operations.
pub type Result<T> = std::result::Result<T, AssistantError>;
