//! The portfolio question-answering facade.
//!
//! [`PortfolioAssistant`] owns one ingestion pipeline, one retriever and one
//! generation client, all sharing the same embedder and vector index, and
//! exposes the three operations an outer HTTP layer needs: `ingest`,
//! `answer` and `health`.

use std::collections::BTreeMap;
use std::sync::Arc;

use folio_model::{CandidateStatus, ContextPassage, GenerationClient, ProbeOutcome};
use folio_rag::{
    Embedder, InMemoryVectorIndex, IngestReport, IngestionPipeline, RagConfig, Retriever,
    SearchResult, VectorIndex,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::{AssistantError, Result};

/// Longest accepted question, in characters.
pub const MAX_QUERY_CHARS: usize = 1000;

/// Source excerpts in an [`Answer`] are cut to this many characters.
pub const SOURCE_PREVIEW_CHARS: usize = 500;

/// A retrieved excerpt backing an answer.
#[derive(Debug, Clone, Serialize)]
pub struct Source {
    /// Chunk text, at most [`SOURCE_PREVIEW_CHARS`] characters.
    pub content: String,
    /// Origin (`source`, `part` or `window_index`) plus any extra chunk metadata.
    pub metadata: BTreeMap<String, String>,
    /// Cosine similarity to the question.
    pub score: f32,
}

/// A grounded answer and the model that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub served_by: String,
    /// Context passed to the model, most relevant first.
    pub sources: Vec<Source>,
}

/// Coarse status of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Ok,
    Error,
}

/// Snapshot returned by [`PortfolioAssistant::health`].
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub embedder: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedder_error: Option<String>,
    pub index_size: usize,
    pub index_generation: u64,
    pub candidates: Vec<CandidateStatus>,
}

/// Retrieval-augmented question answering over a single portfolio document.
///
/// # Example
///
/// ```rust,ignore
/// use folio_assistant::PortfolioAssistant;
///
/// let assistant = PortfolioAssistant::builder()
///     .embedder(embedder)
///     .generator(client)
///     .build()?;
///
/// assistant.ingest(&raw_portfolio).await?;
/// let answer = assistant.answer("What skills are listed?", None).await?;
/// println!("{} ({})", answer.answer, answer.served_by);
/// ```
pub struct PortfolioAssistant {
    pipeline: IngestionPipeline,
    retriever: Retriever,
    generator: GenerationClient,
}

impl PortfolioAssistant {
    /// Create a new [`PortfolioAssistantBuilder`].
    pub fn builder() -> PortfolioAssistantBuilder {
        PortfolioAssistantBuilder::default()
    }

    /// The generation client, for callers that need direct access to candidates.
    pub fn generator(&self) -> &GenerationClient {
        &self.generator
    }

    /// Replace the indexed portfolio with `raw_document`.
    ///
    /// On failure the previously indexed portfolio keeps serving.
    pub async fn ingest(&self, raw_document: &str) -> Result<IngestReport> {
        Ok(self.pipeline.ingest(raw_document).await?)
    }

    /// Answer `query` from the indexed portfolio using up to `k` excerpts.
    ///
    /// # Errors
    ///
    /// - [`AssistantError::InvalidQuery`] for a blank or overlong question
    /// - [`AssistantError::NotReady`] when nothing has been ingested
    /// - [`AssistantError::Rag`] when embedding or search fails
    /// - [`AssistantError::Generation`] when no model candidate could answer
    #[instrument(skip_all, fields(query_len = query.len(), k = ?k))]
    pub async fn answer(&self, query: &str, k: Option<usize>) -> Result<Answer> {
        let query = validate_query(query)?;
        if self.pipeline.index().size().await == 0 {
            warn!("question received before any portfolio was ingested");
            return Err(AssistantError::NotReady);
        }

        let hits = self.retriever.retrieve(query, k).await?;
        let context: Vec<ContextPassage> = hits
            .iter()
            .map(|hit| ContextPassage::new(hit.chunk.origin.to_string(), hit.chunk.text.clone()))
            .collect();

        let generated = self.generator.generate(query, &context).await?;
        info!(
            served_by = %generated.served_by,
            sources = hits.len(),
            fallbacks = generated.failed_attempts.len(),
            "answered question"
        );

        Ok(Answer {
            answer: generated.answer,
            served_by: generated.served_by,
            sources: hits.iter().map(source_preview).collect(),
        })
    }

    /// Report embedder, index and model candidate status.
    ///
    /// The embedder is checked live with a probe embedding; candidate states
    /// come from the shared health registry without calling any model.
    pub async fn health(&self) -> HealthReport {
        let (embedder, embedder_error) = match self.pipeline.embedder().health_check().await {
            Ok(()) => (ComponentStatus::Ok, None),
            Err(e) => {
                warn!(error = %e, "embedder health check failed");
                (ComponentStatus::Error, Some(e.to_string()))
            }
        };
        let index = self.pipeline.index();

        HealthReport {
            embedder,
            embedder_error,
            index_size: index.size().await,
            index_generation: index.generation().await,
            candidates: self.generator.candidate_statuses(),
        }
    }

    /// Send a connectivity prompt to every model candidate and record the results.
    pub async fn probe_models(&self) -> Vec<ProbeOutcome> {
        self.generator.probe().await
    }
}

fn validate_query(query: &str) -> Result<&str> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AssistantError::InvalidQuery("question must not be empty".into()));
    }
    let len = query.chars().count();
    if len > MAX_QUERY_CHARS {
        return Err(AssistantError::InvalidQuery(format!(
            "question is {len} characters, the limit is {MAX_QUERY_CHARS}"
        )));
    }
    Ok(query)
}

fn source_preview(hit: &SearchResult) -> Source {
    let content = match hit.chunk.text.char_indices().nth(SOURCE_PREVIEW_CHARS) {
        Some((cut, _)) => hit.chunk.text[..cut].to_string(),
        None => hit.chunk.text.clone(),
    };
    Source { content, metadata: hit.chunk.metadata(), score: hit.score }
}

/// Builder for constructing a [`PortfolioAssistant`].
///
/// `embedder` and `generator` are required. `index` defaults to an
/// [`InMemoryVectorIndex`] sized for the embedder and `config` to
/// [`RagConfig::default()`].
#[derive(Default)]
pub struct PortfolioAssistantBuilder {
    config: Option<RagConfig>,
    embedder: Option<Arc<dyn Embedder>>,
    index: Option<Arc<dyn VectorIndex>>,
    generator: Option<GenerationClient>,
}

impl PortfolioAssistantBuilder {
    /// Set the chunking and retrieval configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedder shared by ingestion and retrieval.
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Use a custom vector index.
    pub fn index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Set the generation client.
    pub fn generator(mut self, generator: GenerationClient) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Build the [`PortfolioAssistant`].
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::ConfigError`] if a required component is
    /// missing, or [`AssistantError::Rag`] if the embedder and index disagree
    /// on vector dimension.
    pub fn build(self) -> Result<PortfolioAssistant> {
        let embedder = self
            .embedder
            .ok_or_else(|| AssistantError::ConfigError("embedder is required".into()))?;
        let generator = self
            .generator
            .ok_or_else(|| AssistantError::ConfigError("generator is required".into()))?;
        let config = self.config.unwrap_or_default();
        let index = self
            .index
            .unwrap_or_else(|| Arc::new(InMemoryVectorIndex::new(embedder.dimensions())));

        let pipeline = IngestionPipeline::builder()
            .config(config.clone())
            .embedder(Arc::clone(&embedder))
            .index(Arc::clone(&index))
            .build()?;
        let retriever = Retriever::new(config, embedder, index)?;

        Ok(PortfolioAssistant { pipeline, retriever, generator })
    }
}
