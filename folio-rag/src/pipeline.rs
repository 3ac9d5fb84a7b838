//! Ingestion pipeline: chunk → embed → swap a new index generation in.
//!
//! # Example
//!
//! ```rust,ignore
//! use folio_rag::{IngestionPipeline, InMemoryVectorIndex, RagConfig};
//!
//! let pipeline = IngestionPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedder(embedder.clone())
//!     .index(Arc::new(InMemoryVectorIndex::new(embedder.dimensions())))
//!     .build()?;
//!
//! let report = pipeline.ingest(&raw_portfolio).await?;
//! println!("{} chunks indexed", report.chunk_count);
//! ```

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, instrument};

use crate::chunking::{Chunker, SectionChunker};
use crate::config::RagConfig;
use crate::document::EmbeddedChunk;
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::index::VectorIndex;

/// Outcome of a successful reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Number of chunks now in the index.
    pub chunk_count: usize,
    /// The index generation that was swapped in.
    pub generation: u64,
}

/// Rebuilds the vector index from a raw document.
///
/// A reload is transactional: every chunk is embedded before the index is
/// touched, and the index is replaced with a single
/// [`upsert_generation`](VectorIndex::upsert_generation) call. If any step
/// fails the previous generation keeps serving. Concurrent reloads queue up
/// behind each other. Construct one via [`IngestionPipeline::builder()`].
pub struct IngestionPipeline {
    config: RagConfig,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    chunker: Arc<dyn Chunker>,
    reload_lock: Mutex<()>,
}

impl IngestionPipeline {
    /// Create a new [`IngestionPipelineBuilder`].
    pub fn builder() -> IngestionPipelineBuilder {
        IngestionPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedder.
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Return a reference to the vector index.
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Replace the index contents with the chunks of `raw_document`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IngestionError`] if the document yields no chunks,
    /// if embedding fails, or if the index rejects the new generation. In
    /// every case the prior generation stays active.
    #[instrument(skip_all, fields(document_len = raw_document.len()))]
    pub async fn ingest(&self, raw_document: &str) -> Result<IngestReport> {
        let _reload = self.reload_lock.lock().await;

        let chunks = self.chunker.chunk(raw_document);
        if chunks.is_empty() {
            error!("document produced no chunks");
            return Err(RagError::ingestion(
                "chunking failed",
                RagError::ConfigError("document produced no chunks".to_string()),
            ));
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
            error!(chunk_count = chunks.len(), error = %e, "embedding failed during ingestion");
            RagError::ingestion("embedding failed", e)
        })?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::ingestion(
                "embedding failed",
                RagError::embedding(
                    self.embedder.name(),
                    format!("{} vectors for {} chunks", embeddings.len(), chunks.len()),
                ),
            ));
        }

        let entries: Vec<EmbeddedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| EmbeddedChunk { chunk, embedding })
            .collect();
        let chunk_count = entries.len();

        let generation = self.index.upsert_generation(entries).await.map_err(|e| {
            error!(error = %e, "index rejected new generation");
            RagError::ingestion("index update failed", e)
        })?;

        info!(chunk_count, generation, "ingested document");
        Ok(IngestReport { chunk_count, generation })
    }
}

/// Builder for constructing an [`IngestionPipeline`].
///
/// `embedder` and `index` are required. `config` defaults to
/// [`RagConfig::default()`] and `chunker` to a [`SectionChunker`] built from it.
#[derive(Default)]
pub struct IngestionPipelineBuilder {
    config: Option<RagConfig>,
    embedder: Option<Arc<dyn Embedder>>,
    index: Option<Arc<dyn VectorIndex>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl IngestionPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedder.
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the vector index.
    pub fn index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Override the chunking policy.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`IngestionPipeline`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing or the
    /// embedder and index disagree on vector dimension.
    pub fn build(self) -> Result<IngestionPipeline> {
        let config = self.config.unwrap_or_default();
        let embedder =
            self.embedder.ok_or_else(|| RagError::ConfigError("embedder is required".into()))?;
        let index = self.index.ok_or_else(|| RagError::ConfigError("index is required".into()))?;
        check_dimensions(embedder.as_ref(), index.as_ref())?;
        let chunker =
            self.chunker.unwrap_or_else(|| Arc::new(SectionChunker::from_config(&config)));

        Ok(IngestionPipeline { config, embedder, index, chunker, reload_lock: Mutex::new(()) })
    }
}

pub(crate) fn check_dimensions(embedder: &dyn Embedder, index: &dyn VectorIndex) -> Result<()> {
    if embedder.dimensions() != index.dimensions() {
        return Err(RagError::ConfigError(format!(
            "embedder '{}' produces {}-dimensional vectors but the index expects {}",
            embedder.name(),
            embedder.dimensions(),
            index.dimensions()
        )));
    }
    Ok(())
}
