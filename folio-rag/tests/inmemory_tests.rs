//! Property tests for in-memory vector index search ordering.

use folio_rag::document::{ChunkOrigin, DocumentChunk, EmbeddedChunk};
use folio_rag::inmemory::InMemoryVectorIndex;
use folio_rag::index::VectorIndex;
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

fn arb_entry(dim: usize) -> impl Strategy<Value = EmbeddedChunk> {
    ("[a-z]{3,8}", "[a-z ]{5,30}", arb_normalized_embedding(dim)).prop_map(
        |(name, text, embedding)| EmbeddedChunk {
            chunk: DocumentChunk::new(text, ChunkOrigin::Fielded { name, part: 0 }),
            embedding,
        },
    )
}

/// Searching SHALL return results ordered by descending cosine similarity,
/// and the number of results SHALL be at most `k` and at most the entry count.
mod prop_inmemory_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded_by_k(
            entries in proptest::collection::vec(arb_entry(DIM), 0..20),
            query in arb_normalized_embedding(DIM),
            k in 1usize..25,
        ) {
            let count = entries.len();
            let rt = tokio::runtime::Runtime::new().unwrap();
            let results = rt.block_on(async {
                let index = InMemoryVectorIndex::new(DIM);
                index.upsert_generation(entries).await.unwrap();
                index.query(&query, k).await.unwrap()
            });

            prop_assert!(results.len() <= k);
            prop_assert_eq!(results.len(), k.min(count));

            for window in results.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
                if window[0].score == window[1].score {
                    prop_assert!(window[0].entry_id < window[1].entry_id);
                }
            }
        }

        #[test]
        fn generation_size_matches_entry_count(
            first in proptest::collection::vec(arb_entry(DIM), 0..10),
            second in proptest::collection::vec(arb_entry(DIM), 0..10),
        ) {
            let expected = second.len();
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (size, generation) = rt.block_on(async {
                let index = InMemoryVectorIndex::new(DIM);
                index.upsert_generation(first).await.unwrap();
                index.upsert_generation(second).await.unwrap();
                (index.size().await, index.generation().await)
            });
            prop_assert_eq!(size, expected);
            prop_assert_eq!(generation, 2);
        }
    }
}
