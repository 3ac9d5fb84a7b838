//! In-process sentence-transformer embeddings via `fastembed`.
//!
//! This module is only available when the `local` feature is enabled.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{debug, error, info};

use crate::embedding::{Embedder, ensure_dimensions, l2_normalize, validate_inputs};
use crate::error::{RagError, Result};

const PROVIDER: &str = "fastembed";

/// The default model: multilingual, so portfolios and questions need not be in English.
pub const DEFAULT_MODEL: &str = "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2";

/// Model identifiers this embedder understands, with their output dimensions.
const KNOWN_MODELS: &[(&str, usize)] = &[
    ("sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2", 384),
    ("sentence-transformers/all-MiniLM-L6-v2", 384),
    ("BAAI/bge-small-en-v1.5", 384),
];

fn resolve_model(id: &str) -> Option<(EmbeddingModel, usize)> {
    let dims = KNOWN_MODELS.iter().find(|(name, _)| *name == id).map(|(_, d)| *d)?;
    let model = match id {
        "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2" => {
            EmbeddingModel::ParaphraseMLMiniLML12V2
        }
        "sentence-transformers/all-MiniLM-L6-v2" => EmbeddingModel::AllMiniLML6V2,
        "BAAI/bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
        _ => return None,
    };
    Some((model, dims))
}

/// Settings for [`FastEmbedEmbedder`].
#[derive(Debug, Clone)]
pub struct FastEmbedConfig {
    /// HuggingFace-style model identifier, see [`DEFAULT_MODEL`].
    pub model: String,
    /// Where downloaded model files are cached. `None` uses fastembed's default.
    pub cache_dir: Option<PathBuf>,
    /// Upper bound on a single `embed`/`embed_batch` call.
    pub timeout: Duration,
    /// Longest accepted input, in characters.
    pub max_input_chars: usize,
}

impl Default for FastEmbedConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            cache_dir: None,
            timeout: Duration::from_secs(30),
            max_input_chars: 8192,
        }
    }
}

/// An [`Embedder`] running an ONNX sentence-transformer in process.
///
/// The model is loaded once, synchronously, in [`FastEmbedEmbedder::new`].
/// Construct it during startup; the returned handle is ready to use and is
/// cheap to share behind an `Arc`. Inference is CPU bound and runs on the
/// blocking thread pool.
pub struct FastEmbedEmbedder {
    model: Arc<TextEmbedding>,
    model_id: String,
    dimensions: usize,
    timeout: Duration,
    max_input_chars: usize,
}

impl FastEmbedEmbedder {
    /// Load the configured model, downloading it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] for an unknown model identifier or
    /// when the model cannot be loaded.
    pub fn new(config: FastEmbedConfig) -> Result<Self> {
        let (model, dimensions) = resolve_model(&config.model).ok_or_else(|| {
            RagError::embedding(PROVIDER, format!("unsupported model '{}'", config.model))
        })?;

        info!(model = %config.model, "loading embedding model");
        let mut options = InitOptions::new(model).with_show_download_progress(false);
        if let Some(dir) = &config.cache_dir {
            options = options.with_cache_dir(dir.clone());
        }
        let model = TextEmbedding::try_new(options).map_err(|e| {
            error!(model = %config.model, error = %e, "failed to load embedding model");
            RagError::embedding(PROVIDER, format!("failed to load '{}': {e}", config.model))
        })?;
        info!(model = %config.model, dimensions, "embedding model loaded");

        Ok(Self {
            model: Arc::new(model),
            model_id: config.model,
            dimensions,
            timeout: config.timeout,
            max_input_chars: config.max_input_chars,
        })
    }

    /// The model identifier this embedder was built with.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[async_trait]
impl Embedder for FastEmbedEmbedder {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text]).await?;
        vectors.pop().ok_or_else(|| RagError::embedding(PROVIDER, "model returned no vector"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        validate_inputs(PROVIDER, texts, self.max_input_chars)?;
        debug!(provider = PROVIDER, batch_size = texts.len(), "embedding batch");

        let model = Arc::clone(&self.model);
        let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        let task = tokio::task::spawn_blocking(move || model.embed(owned, None));

        let vectors = match tokio::time::timeout(self.timeout, task).await {
            Err(_) => {
                error!(provider = PROVIDER, timeout = ?self.timeout, "embedding timed out");
                return Err(RagError::embedding(
                    PROVIDER,
                    format!("embedding timed out after {:?}", self.timeout),
                ));
            }
            Ok(Err(join)) => {
                return Err(RagError::embedding(PROVIDER, format!("embedding task failed: {join}")));
            }
            Ok(Ok(Err(e))) => {
                error!(provider = PROVIDER, error = %e, "embedding failed");
                return Err(RagError::embedding(PROVIDER, e.to_string()));
            }
            Ok(Ok(Ok(vectors))) => vectors,
        };

        if vectors.len() != texts.len() {
            return Err(RagError::embedding(
                PROVIDER,
                format!("model returned {} vectors for {} inputs", vectors.len(), texts.len()),
            ));
        }
        ensure_dimensions(PROVIDER, &vectors, self.dimensions)?;

        Ok(vectors
            .into_iter()
            .map(|mut v| {
                l2_normalize(&mut v);
                v
            })
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
