//! Ingestion and retrieval behaviour across the pipeline.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use folio_rag::{
    ChunkOrigin, DocumentChunk, EmbeddedChunk, Embedder, InMemoryVectorIndex, IngestionPipeline,
    MockEmbedder, RagConfig, RagError, Retriever, VectorIndex,
};
use tokio::sync::Notify;

const DIM: usize = 256;

const PORTFOLIO: &str = r#"{"skills": "Python, Go", "experience": "Backend engineer, 3 years"}"#;

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (na * nb)
}

fn setup(embedder: Arc<dyn Embedder>) -> (IngestionPipeline, Retriever, Arc<InMemoryVectorIndex>) {
    let index = Arc::new(InMemoryVectorIndex::new(embedder.dimensions()));
    let pipeline = IngestionPipeline::builder()
        .config(RagConfig::default())
        .embedder(embedder.clone())
        .index(index.clone())
        .build()
        .unwrap();
    let retriever = Retriever::new(RagConfig::default(), embedder, index.clone()).unwrap();
    (pipeline, retriever, index)
}

/// Delegates to [`MockEmbedder`] but can fail or block batch calls on demand.
struct ControlledEmbedder {
    inner: MockEmbedder,
    fail_batches: AtomicBool,
    pause_batches: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl ControlledEmbedder {
    fn new() -> Self {
        Self {
            inner: MockEmbedder::new(DIM),
            fail_batches: AtomicBool::new(false),
            pause_batches: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl Embedder for ControlledEmbedder {
    fn name(&self) -> &str {
        "controlled"
    }

    async fn embed(&self, text: &str) -> folio_rag::Result<Vec<f32>> {
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> folio_rag::Result<Vec<Vec<f32>>> {
        if self.pause_batches.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        if self.fail_batches.load(Ordering::SeqCst) {
            return Err(RagError::EmbeddingError {
                provider: "controlled".into(),
                message: "model unavailable".into(),
            });
        }
        self.inner.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Returns a fixed vector per known text.
struct TableEmbedder(HashMap<&'static str, Vec<f32>>);

#[async_trait]
impl Embedder for TableEmbedder {
    fn name(&self) -> &str {
        "table"
    }

    async fn embed(&self, text: &str) -> folio_rag::Result<Vec<f32>> {
        self.0.get(text).cloned().ok_or_else(|| RagError::EmbeddingError {
            provider: "table".into(),
            message: format!("unknown text '{text}'"),
        })
    }

    fn dimensions(&self) -> usize {
        3
    }
}

#[tokio::test]
async fn skills_question_retrieves_skills_chunk_first() {
    let (pipeline, retriever, _) = setup(Arc::new(MockEmbedder::new(DIM)));
    let report = pipeline.ingest(PORTFOLIO).await.unwrap();
    assert_eq!(report.chunk_count, 2);

    let results = retriever.retrieve("What skills are listed?", None).await.unwrap();
    assert_eq!(results[0].chunk.origin.source_id(), "skills");
    assert!(results[0].chunk.text.contains("Python"));
}

#[tokio::test]
async fn reingesting_same_document_is_idempotent() {
    let (pipeline, retriever, index) = setup(Arc::new(MockEmbedder::new(DIM)));

    let first = pipeline.ingest(PORTFOLIO).await.unwrap();
    let before = retriever.retrieve("backend experience", Some(2)).await.unwrap();
    let second = pipeline.ingest(PORTFOLIO).await.unwrap();
    let after = retriever.retrieve("backend experience", Some(2)).await.unwrap();

    assert_eq!(first.chunk_count, second.chunk_count);
    assert_eq!(second.generation, first.generation + 1);
    assert_eq!(index.size().await, 2);
    assert_eq!(before.len(), after.len());
    for (a, b) in before.iter().zip(&after) {
        assert_eq!(a.chunk, b.chunk);
        assert!((a.score - b.score).abs() < 1e-5);
    }
}

#[tokio::test]
async fn embedding_failure_preserves_prior_generation() {
    let embedder = Arc::new(ControlledEmbedder::new());
    let (pipeline, retriever, index) = setup(embedder.clone());
    pipeline.ingest(PORTFOLIO).await.unwrap();

    embedder.fail_batches.store(true, Ordering::SeqCst);
    let err = pipeline.ingest(r#"{"hobbies": "Climbing"}"#).await.unwrap_err();
    assert!(matches!(err, RagError::IngestionError { .. }));

    assert_eq!(index.size().await, 2);
    assert_eq!(index.generation().await, 1);
    let results = retriever.retrieve("skills", Some(10)).await.unwrap();
    assert!(results.iter().all(|r| r.chunk.origin.source_id() != "hobbies"));
}

#[tokio::test]
async fn empty_document_is_rejected_without_clearing_index() {
    let (pipeline, _, index) = setup(Arc::new(MockEmbedder::new(DIM)));
    pipeline.ingest(PORTFOLIO).await.unwrap();

    let err = pipeline.ingest("   ").await.unwrap_err();
    assert!(matches!(err, RagError::IngestionError { .. }));
    assert_eq!(index.size().await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn query_during_reload_sees_one_complete_generation() {
    let embedder = Arc::new(ControlledEmbedder::new());
    let (pipeline, retriever, index) = setup(embedder.clone());
    pipeline.ingest("[Alpha]\nalpha one\n[Alpha Two]\nalpha two").await.unwrap();

    embedder.pause_batches.store(true, Ordering::SeqCst);
    let pipeline = Arc::new(pipeline);
    let reload = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            pipeline.ingest("[Beta]\nbeta one\n[Beta Two]\nbeta two\n[Beta Three]\nbeta three").await
        })
    };

    // The reload is now parked mid-build.
    embedder.entered.notified().await;
    let during = retriever.retrieve("alpha beta", Some(10)).await.unwrap();
    assert_eq!(during.len(), 2);
    assert!(during.iter().all(|r| r.chunk.text.contains("alpha")));
    assert_eq!(index.generation().await, 1);

    embedder.pause_batches.store(false, Ordering::SeqCst);
    embedder.release.notify_one();
    let report = reload.await.unwrap().unwrap();
    assert_eq!(report.chunk_count, 3);

    let after = retriever.retrieve("alpha beta", Some(10)).await.unwrap();
    assert_eq!(after.len(), 3);
    assert!(after.iter().all(|r| r.chunk.text.contains("beta")));
}

#[tokio::test]
async fn retrieve_returns_two_closest_of_three() {
    let table = TableEmbedder(HashMap::from([
        ("north", vec![0.0, 1.0, 0.0]),
        ("east", vec![1.0, 0.0, 0.0]),
        ("up", vec![0.0, 0.0, 1.0]),
        ("north-east-ish", vec![0.6, 0.8, 0.0]),
    ]));
    let embedder: Arc<dyn Embedder> = Arc::new(table);
    let index = Arc::new(InMemoryVectorIndex::new(3));

    let mut entries = Vec::new();
    for name in ["north", "east", "up"] {
        entries.push(EmbeddedChunk {
            chunk: DocumentChunk::new(name, ChunkOrigin::Fielded { name: name.into(), part: 0 }),
            embedding: embedder.embed(name).await.unwrap(),
        });
    }
    index.upsert_generation(entries).await.unwrap();

    let retriever = Retriever::new(RagConfig::default(), embedder, index).unwrap();
    let results = retriever.retrieve("north-east-ish", Some(2)).await.unwrap();

    let names: Vec<_> = results.iter().map(|r| r.chunk.text.as_str()).collect();
    assert_eq!(names, ["north", "east"]);
    assert!((results[0].score - 0.8).abs() < 1e-5);
    assert!((results[1].score - 0.6).abs() < 1e-5);
}

#[tokio::test]
async fn retrieve_on_cleared_index_is_empty() {
    let (pipeline, retriever, index) = setup(Arc::new(MockEmbedder::new(DIM)));
    pipeline.ingest(PORTFOLIO).await.unwrap();
    index.upsert_generation(Vec::new()).await.unwrap();

    let results = retriever.retrieve("skills", None).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn k_is_clamped_to_configured_bounds() {
    let embedder = Arc::new(MockEmbedder::new(DIM));
    let index = Arc::new(InMemoryVectorIndex::new(DIM));
    let config = RagConfig::builder().default_top_k(2).max_top_k(3).build().unwrap();
    let pipeline = IngestionPipeline::builder()
        .config(config.clone())
        .embedder(embedder.clone())
        .index(index.clone())
        .build()
        .unwrap();
    pipeline.ingest("# A\none\n# B\ntwo\n# C\nthree\n# D\nfour\n# E\nfive").await.unwrap();

    let retriever = Retriever::new(config, embedder, index).unwrap();
    assert_eq!(retriever.retrieve("one", None).await.unwrap().len(), 2);
    assert_eq!(retriever.retrieve("one", Some(0)).await.unwrap().len(), 2);
    assert_eq!(retriever.retrieve("one", Some(1)).await.unwrap().len(), 1);
    assert_eq!(retriever.retrieve("one", Some(50)).await.unwrap().len(), 3);
}

#[tokio::test]
async fn mismatched_embedder_and_index_fail_at_build() {
    let result = IngestionPipeline::builder()
        .embedder(Arc::new(MockEmbedder::new(8)))
        .index(Arc::new(InMemoryVectorIndex::new(16)))
        .build();
    assert!(matches!(result, Err(RagError::ConfigError(_))));
}

#[tokio::test]
async fn same_text_embeds_consistently() {
    let embedder = MockEmbedder::new(DIM);
    let a = embedder.embed("Backend engineer, 3 years").await.unwrap();
    let b = embedder.embed("Backend engineer, 3 years").await.unwrap();
    assert!(cosine(&a, &b) > 0.9999);
}

#[tokio::test]
async fn long_section_names_stay_within_embedding_limit() {
    let config = RagConfig::builder()
        .window_size(50)
        .window_overlap(5)
        .max_input_chars(60)
        .build()
        .unwrap();
    let embedder = Arc::new(MockEmbedder::new(DIM).with_max_input_chars(60));
    let index = Arc::new(InMemoryVectorIndex::new(DIM));
    let pipeline = IngestionPipeline::builder()
        .config(config)
        .embedder(embedder)
        .index(index.clone())
        .build()
        .unwrap();

    let raw = format!(r#"{{"{}": "Backend engineer on the payments platform"}}"#, "k".repeat(58));
    let report = pipeline.ingest(&raw).await.unwrap();
    assert!(report.chunk_count >= 1);
    assert_eq!(index.size().await, report.chunk_count);
}

#[tokio::test]
async fn heading_only_document_is_indexed() {
    let (pipeline, retriever, _) = setup(Arc::new(MockEmbedder::new(DIM)));

    let report = pipeline.ingest("# Jane Doe").await.unwrap();
    assert_eq!(report.chunk_count, 1);

    pipeline
        .ingest("# Jane Doe\n## Skills\nRust, Go\n## Experience\nBackend engineer")
        .await
        .unwrap();
    let results = retriever.retrieve("Who is Jane Doe?", Some(1)).await.unwrap();
    assert_eq!(results[0].chunk.text, "Jane Doe");
}
