//! In-memory vector index using an exact cosine-similarity scan.
//!
//! [`InMemoryVectorIndex`] keeps the active generation behind an
//! `Arc` inside a `tokio::sync::RwLock`. Writers build a complete generation
//! off to the side and swap the `Arc` in one step; readers clone the `Arc`
//! and scan without holding the lock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::document::{DocumentChunk, EmbeddedChunk, EntryId, QueryResult, SearchResult};
use crate::embedding::l2_normalize;
use crate::error::{RagError, Result};
use crate::index::VectorIndex;

#[derive(Debug)]
struct IndexEntry {
    id: EntryId,
    chunk: DocumentChunk,
    /// Stored unit-length so scoring is a dot product.
    unit: Vec<f32>,
}

#[derive(Debug, Default)]
struct Generation {
    number: u64,
    entries: Vec<IndexEntry>,
}

/// An exact-scan vector index for small corpora.
///
/// Suitable for tens to thousands of entries. Entry ids are unique across
/// generations for the lifetime of the index.
#[derive(Debug)]
pub struct InMemoryVectorIndex {
    dimensions: usize,
    active: RwLock<Arc<Generation>>,
    next_entry: AtomicU64,
}

impl InMemoryVectorIndex {
    /// Create an empty index for vectors of the given dimension.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            active: RwLock::new(Arc::new(Generation::default())),
            next_entry: AtomicU64::new(0),
        }
    }

    fn check_dimensions(&self, actual: usize) -> Result<()> {
        if actual != self.dimensions {
            return Err(RagError::dimension_mismatch(self.dimensions, actual));
        }
        Ok(())
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn upsert_generation(&self, entries: Vec<EmbeddedChunk>) -> Result<u64> {
        // Validate everything before touching shared state.
        for entry in &entries {
            if let Err(e) = self.check_dimensions(entry.embedding.len()) {
                error!(error = %e, "rejecting generation");
                return Err(e);
            }
        }

        let built: Vec<IndexEntry> = entries
            .into_iter()
            .map(|EmbeddedChunk { chunk, mut embedding }| {
                l2_normalize(&mut embedding);
                let id = EntryId(self.next_entry.fetch_add(1, Ordering::Relaxed));
                IndexEntry { id, chunk, unit: embedding }
            })
            .collect();
        let size = built.len();

        let mut active = self.active.write().await;
        let number = active.number + 1;
        *active = Arc::new(Generation { number, entries: built });
        drop(active);

        info!(generation = number, size, "vector index generation swapped in");
        Ok(number)
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<QueryResult> {
        self.check_dimensions(vector.len())?;
        let snapshot = Arc::clone(&*self.active.read().await);
        if k == 0 || snapshot.entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = vector.to_vec();
        l2_normalize(&mut query);

        let mut scored: Vec<(usize, f32)> = snapshot
            .entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| (pos, dot(&entry.unit, &query)))
            .collect();
        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        debug!(generation = snapshot.number, k, hits = scored.len(), "index query");
        Ok(scored
            .into_iter()
            .map(|(pos, score)| {
                let entry = &snapshot.entries[pos];
                SearchResult { entry_id: entry.id, chunk: entry.chunk.clone(), score }
            })
            .collect())
    }

    async fn size(&self) -> usize {
        self.active.read().await.entries.len()
    }

    async fn generation(&self) -> u64 {
        self.active.read().await.number
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ChunkOrigin;

    fn entry(name: &str, embedding: Vec<f32>) -> EmbeddedChunk {
        EmbeddedChunk {
            chunk: DocumentChunk::new(name, ChunkOrigin::Fielded { name: name.into(), part: 0 }),
            embedding,
        }
    }

    #[tokio::test]
    async fn query_on_empty_index_is_empty() {
        let index = InMemoryVectorIndex::new(3);
        assert!(index.query(&[1.0, 0.0, 0.0], 5).await.unwrap().is_empty());
        assert_eq!(index.generation().await, 0);
    }

    #[tokio::test]
    async fn returns_closest_in_descending_order() {
        let index = InMemoryVectorIndex::new(3);
        index
            .upsert_generation(vec![
                entry("x", vec![1.0, 0.0, 0.0]),
                entry("y", vec![0.0, 1.0, 0.0]),
                entry("z", vec![0.0, 0.0, 1.0]),
            ])
            .await
            .unwrap();

        let results = index.query(&[0.9, 0.4, 0.0], 2).await.unwrap();
        let names: Vec<_> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        assert_eq!(names, ["x", "y"]);
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn ties_prefer_earlier_entries() {
        let index = InMemoryVectorIndex::new(2);
        index
            .upsert_generation(vec![
                entry("first", vec![1.0, 0.0]),
                entry("second", vec![2.0, 0.0]),
                entry("third", vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let results = index.query(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results[0].chunk.text, "first");
        assert_eq!(results[1].chunk.text, "second");
        assert!(results[0].entry_id < results[1].entry_id);
    }

    #[tokio::test]
    async fn dimension_mismatch_keeps_prior_generation() {
        let index = InMemoryVectorIndex::new(2);
        index.upsert_generation(vec![entry("old", vec![1.0, 0.0])]).await.unwrap();

        let err = index
            .upsert_generation(vec![entry("new", vec![1.0, 0.0]), entry("bad", vec![1.0])])
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::IndexError { .. }));

        assert_eq!(index.size().await, 1);
        assert_eq!(index.generation().await, 1);
        let results = index.query(&[1.0, 0.0], 5).await.unwrap();
        assert_eq!(results[0].chunk.text, "old");
    }

    #[tokio::test]
    async fn query_with_wrong_dimension_is_index_error() {
        let index = InMemoryVectorIndex::new(2);
        let err = index.query(&[1.0, 0.0, 0.0], 1).await.unwrap_err();
        assert!(matches!(err, RagError::IndexError { .. }));
    }

    #[tokio::test]
    async fn empty_generation_clears_index() {
        let index = InMemoryVectorIndex::new(2);
        index.upsert_generation(vec![entry("a", vec![1.0, 0.0])]).await.unwrap();
        let number = index.upsert_generation(Vec::new()).await.unwrap();

        assert_eq!(number, 2);
        assert_eq!(index.size().await, 0);
        assert!(index.query(&[1.0, 0.0], 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn entry_ids_are_not_reused_across_generations() {
        let index = InMemoryVectorIndex::new(2);
        index.upsert_generation(vec![entry("a", vec![1.0, 0.0])]).await.unwrap();
        let first = index.query(&[1.0, 0.0], 1).await.unwrap()[0].entry_id;
        index.upsert_generation(vec![entry("a", vec![1.0, 0.0])]).await.unwrap();
        let second = index.query(&[1.0, 0.0], 1).await.unwrap()[0].entry_id;
        assert_ne!(first, second);
    }
}
