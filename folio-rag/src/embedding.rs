//! The [`Embedder`] trait for turning text into fixed-length vectors.

use async_trait::async_trait;

use crate::error::{RagError, Result};

/// Text embedded by [`Embedder::health_check`].
pub const HEALTH_PROBE_TEXT: &str = "health check";

/// Converts text into fixed-dimension embedding vectors.
///
/// Implementations must be deterministic for a fixed model version and must
/// load their model during construction, so a constructed embedder is ready
/// to serve. [`embed_batch`](Embedder::embed_batch) preserves input order and
/// is all-or-nothing: it either returns one vector per input or an error,
/// never a partial batch.
///
/// # Example
///
/// ```rust,ignore
/// use folio_rag::Embedder;
///
/// let embedder = FastEmbedEmbedder::new(FastEmbedConfig::default())?;
/// let vector = embedder.embed("Backend engineer").await?;
/// assert_eq!(vector.len(), embedder.dimensions());
/// ```
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Provider name used in errors and logs.
    fn name(&self) -> &str;

    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs, in input order.
    ///
    /// The default implementation calls [`embed`](Embedder::embed)
    /// sequentially and discards everything on the first failure. Override
    /// this method if the backend supports native batching.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this embedder.
    fn dimensions(&self) -> usize;

    /// Embed a fixed probe string and verify the output dimension.
    async fn health_check(&self) -> Result<()> {
        let vector = self.embed(HEALTH_PROBE_TEXT).await?;
        ensure_dimensions(self.name(), std::slice::from_ref(&vector), self.dimensions())
    }
}

/// Reject empty inputs and inputs longer than `max_chars` characters.
pub fn validate_inputs(provider: &str, texts: &[&str], max_chars: usize) -> Result<()> {
    for (i, text) in texts.iter().enumerate() {
        if text.trim().is_empty() {
            return Err(RagError::embedding(provider, format!("input {i} is empty")));
        }
        let chars = text.chars().count();
        if chars > max_chars {
            return Err(RagError::embedding(
                provider,
                format!("input {i} is {chars} characters, limit is {max_chars}"),
            ));
        }
    }
    Ok(())
}

/// Verify every vector has the expected dimension.
pub fn ensure_dimensions(provider: &str, vectors: &[Vec<f32>], expected: usize) -> Result<()> {
    match vectors.iter().find(|v| v.len() != expected) {
        Some(bad) => Err(RagError::embedding(
            provider,
            format!("model returned {}-dimensional vector, expected {expected}", bad.len()),
        )),
        None => Ok(()),
    }
}

/// Scale a vector to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}
