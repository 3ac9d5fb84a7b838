//! Vector index trait for storing embedded chunks and answering similarity queries.

use async_trait::async_trait;

use crate::document::{EmbeddedChunk, QueryResult};
use crate::error::Result;

/// A store of embedded chunks with nearest-neighbour search.
///
/// The index holds exactly one active *generation* of entries.
/// [`upsert_generation`](VectorIndex::upsert_generation) replaces the whole
/// set at once: a concurrent [`query`](VectorIndex::query) sees either the
/// complete old generation or the complete new one. Backends are free to use
/// an exact scan or an approximate structure behind this interface.
///
/// # Example
///
/// ```rust,ignore
/// use folio_rag::{InMemoryVectorIndex, VectorIndex};
///
/// let index = InMemoryVectorIndex::new(384);
/// index.upsert_generation(entries).await?;
/// let results = index.query(&query_vector, 3).await?;
/// ```
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// The vector dimension every entry and query must have.
    fn dimensions(&self) -> usize;

    /// Atomically replace all entries with `entries`, returning the new generation number.
    ///
    /// An empty `entries` list clears the index. If any vector has the wrong
    /// dimension the call fails with [`RagError::IndexError`](crate::RagError::IndexError)
    /// and the prior generation stays active.
    async fn upsert_generation(&self, entries: Vec<EmbeddedChunk>) -> Result<u64>;

    /// Return up to `k` entries most similar to `vector`, by descending cosine similarity.
    ///
    /// Equal scores keep insertion order. An empty index yields an empty result.
    async fn query(&self, vector: &[f32], k: usize) -> Result<QueryResult>;

    /// Number of entries in the active generation.
    async fn size(&self) -> usize;

    /// Number of the active generation; `0` before the first upsert.
    async fn generation(&self) -> u64;
}
