//! Deterministic embedder for tests and offline demos.

use async_trait::async_trait;

use crate::embedding::{Embedder, l2_normalize, validate_inputs};
use crate::error::Result;

/// A bag-of-words embedder that needs no model files.
///
/// Each lowercase alphanumeric token is hashed (FNV-1a) into one of
/// `dimensions` buckets and the counts are L2-normalised, so texts sharing
/// words score higher than texts that do not. Not a semantic model.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    dimensions: usize,
    max_input_chars: usize,
}

impl MockEmbedder {
    /// Create an embedder producing `dimensions`-long vectors.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions: dimensions.max(1), max_input_chars: 8192 }
    }

    /// Set the input length limit in characters.
    pub fn with_max_input_chars(mut self, chars: usize) -> Self {
        self.max_input_chars = chars;
        self
    }

    fn bucket(&self, token: &str) -> usize {
        let hash = token
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325u64, |acc, b| (acc ^ b as u64).wrapping_mul(0x0100_0000_01b3));
        (hash % self.dimensions as u64) as usize
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            vector[self.bucket(&token.to_lowercase())] += 1.0;
        }
        l2_normalize(&mut vector);
        vector
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        validate_inputs(self.name(), &[text], self.max_input_chars)?;
        Ok(self.vectorize(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identical_text_gives_identical_vectors() {
        let embedder = MockEmbedder::new(64);
        let a = embedder.embed("Backend engineer").await.unwrap();
        let b = embedder.embed("backend ENGINEER").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn oversized_input_is_rejected() {
        let embedder = MockEmbedder::new(8).with_max_input_chars(4);
        assert!(embedder.embed("too long").await.is_err());
    }
}
