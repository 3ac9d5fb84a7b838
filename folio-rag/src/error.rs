//! Error types for the `folio-rag` crate.

use thiserror::Error;

/// Errors that can occur while embedding, indexing, ingesting or retrieving.
#[derive(Debug, Error)]
pub enum RagError {
    /// The embedding model is unavailable or rejected its input.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector index detected a dimension mismatch or a broken invariant.
    ///
    /// This always points at a bug or configuration drift and must not be swallowed.
    #[error("Index error: {message}")]
    IndexError {
        /// A description of the violated invariant.
        message: String,
    },

    /// A reload failed. The previously active index generation is still serving queries.
    #[error("Ingestion error: {message}: {source}")]
    IngestionError {
        /// The stage that failed.
        message: String,
        /// The underlying failure.
        #[source]
        source: Box<RagError>,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RagError {
    pub(crate) fn embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingError { provider: provider.into(), message: message.into() }
    }

    pub(crate) fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::IndexError {
            message: format!("vector dimension mismatch: expected {expected}, got {actual}"),
        }
    }

    pub(crate) fn ingestion(message: impl Into<String>, source: RagError) -> Self {
        Self::IngestionError { message: message.into(), source: Box::new(source) }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
