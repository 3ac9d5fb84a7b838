//! # folio-rag
//!
//! Retrieval half of the Folio portfolio assistant.
//!
//! ## Overview
//!
//! - [`Embedder`] turns text into fixed-dimension vectors
//! - [`VectorIndex`] stores one atomically-replaced generation of embedded
//!   chunks and answers cosine-similarity queries ([`InMemoryVectorIndex`])
//! - [`IngestionPipeline`] chunks a raw document ([`SectionChunker`]), embeds
//!   every chunk, and swaps the result into the index in one step
//! - [`Retriever`] embeds a query and returns the top-`k` chunks
//!
//! ## Features
//!
//! - `openai`: [`openai::OpenAIEmbedder`] for OpenAI-compatible embedding APIs
//! - `local`: [`local::FastEmbedEmbedder`] for in-process sentence-transformers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use folio_rag::{InMemoryVectorIndex, IngestionPipeline, MockEmbedder, RagConfig, Retriever};
//!
//! let embedder = Arc::new(MockEmbedder::new(256));
//! let index = Arc::new(InMemoryVectorIndex::new(256));
//! let pipeline = IngestionPipeline::builder()
//!     .embedder(embedder.clone())
//!     .index(index.clone())
//!     .build()?;
//! pipeline.ingest(r#"{"skills": "Python, Go"}"#).await?;
//!
//! let retriever = Retriever::new(RagConfig::default(), embedder, index)?;
//! let hits = retriever.retrieve("What skills are listed?", Some(2)).await?;
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod inmemory;
pub mod mock;
pub mod pipeline;
pub mod retriever;

#[cfg(feature = "local")]
pub mod local;
#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::{Chunker, Section, SectionChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{ChunkOrigin, DocumentChunk, EmbeddedChunk, EntryId, QueryResult, SearchResult};
pub use embedding::Embedder;
pub use error::{RagError, Result};
pub use index::VectorIndex;
pub use inmemory::InMemoryVectorIndex;
pub use mock::MockEmbedder;
pub use pipeline::{IngestReport, IngestionPipeline, IngestionPipelineBuilder};
pub use retriever::Retriever;

#[cfg(feature = "local")]
pub use local::{FastEmbedConfig, FastEmbedEmbedder};
#[cfg(feature = "openai")]
pub use openai::OpenAIEmbedder;
