//! Configuration for chunking and retrieval.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Tunables for the ingestion pipeline and the retriever.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Freeform window size `W`, in characters.
    pub window_size: usize,
    /// Overlap `O` between consecutive windows, in characters. Always `< window_size`.
    pub window_overlap: usize,
    /// `k` used when a caller passes no `k` or a zero `k`.
    pub default_top_k: usize,
    /// Upper clamp for caller-supplied `k`.
    pub max_top_k: usize,
    /// Longest text, in characters, an embedder accepts.
    pub max_input_chars: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            window_size: 500,
            window_overlap: 50,
            default_top_k: 3,
            max_top_k: 10,
            max_input_chars: 8192,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Resolve a caller-supplied `k` into `[1, max_top_k]`.
    ///
    /// `None` and `Some(0)` fall back to `default_top_k`.
    pub fn resolve_top_k(&self, k: Option<usize>) -> usize {
        match k {
            None | Some(0) => self.default_top_k,
            Some(k) => k.clamp(1, self.max_top_k),
        }
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the freeform window size in characters.
    pub fn window_size(mut self, size: usize) -> Self {
        self.config.window_size = size;
        self
    }

    /// Set the overlap between consecutive windows in characters.
    pub fn window_overlap(mut self, overlap: usize) -> Self {
        self.config.window_overlap = overlap;
        self
    }

    /// Set the default number of results returned by the retriever.
    pub fn default_top_k(mut self, k: usize) -> Self {
        self.config.default_top_k = k;
        self
    }

    /// Set the maximum number of results a caller may request.
    pub fn max_top_k(mut self, k: usize) -> Self {
        self.config.max_top_k = k;
        self
    }

    /// Set the embedding input length limit in characters.
    pub fn max_input_chars(mut self, chars: usize) -> Self {
        self.config.max_input_chars = chars;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `window_size == 0` or `window_overlap >= window_size`
    /// - `default_top_k == 0` or `default_top_k > max_top_k`
    /// - `max_input_chars < window_size` (every window must be embeddable)
    pub fn build(self) -> Result<RagConfig> {
        let c = &self.config;
        if c.window_size == 0 {
            return Err(RagError::ConfigError("window_size must be greater than zero".into()));
        }
        if c.window_overlap >= c.window_size {
            return Err(RagError::ConfigError(format!(
                "window_overlap ({}) must be less than window_size ({})",
                c.window_overlap, c.window_size
            )));
        }
        if c.default_top_k == 0 {
            return Err(RagError::ConfigError("default_top_k must be greater than zero".into()));
        }
        if c.default_top_k > c.max_top_k {
            return Err(RagError::ConfigError(format!(
                "default_top_k ({}) must not exceed max_top_k ({})",
                c.default_top_k, c.max_top_k
            )));
        }
        if c.max_input_chars < c.window_size {
            return Err(RagError::ConfigError(format!(
                "max_input_chars ({}) must be at least window_size ({})",
                c.max_input_chars, c.window_size
            )));
        }
        Ok(self.config)
    }
}
