//! Query-time retrieval: embed the question, then search the index.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::config::RagConfig;
use crate::document::QueryResult;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::index::VectorIndex;
use crate::pipeline::check_dimensions;

/// Finds the chunks most similar to a query.
///
/// No score threshold is applied; callers that want a relevance cutoff can
/// filter on [`SearchResult::score`](crate::SearchResult::score).
#[derive(Clone)]
pub struct Retriever {
    config: RagConfig,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl Retriever {
    /// Create a retriever over `index`, embedding queries with `embedder`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`](crate::RagError::ConfigError) if the
    /// embedder and index disagree on vector dimension.
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
    ) -> Result<Self> {
        check_dimensions(embedder.as_ref(), index.as_ref())?;
        Ok(Self { config, embedder, index })
    }

    /// Return up to `k` chunks by descending similarity to `query`.
    ///
    /// `k` is clamped to `[1, max_top_k]`; `None` or `Some(0)` use `default_top_k`.
    /// Against an empty index this returns an empty result.
    ///
    /// # Errors
    ///
    /// Embedding and index errors are returned unchanged.
    #[instrument(skip_all, fields(query_len = query.len()))]
    pub async fn retrieve(&self, query: &str, k: Option<usize>) -> Result<QueryResult> {
        let k = self.config.resolve_top_k(k);
        let vector = self.embedder.embed(query).await?;
        let results = self.index.query(&vector, k).await?;
        debug!(k, result_count = results.len(), "retrieval completed");
        Ok(results)
    }
}
