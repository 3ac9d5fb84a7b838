//! Data types for chunks, index entries and query results.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a chunk came from inside the raw document.
///
/// The two variants mirror the two chunking paths: documents that declare
/// their own sections, and freeform text cut into overlapping windows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChunkOrigin {
    /// A declared field or section. `part` counts from zero when an oversized
    /// section had to be windowed.
    Fielded { name: String, part: usize },
    /// The `window_index`-th window of freeform text.
    Freeform { window_index: usize },
}

impl ChunkOrigin {
    /// Stable source identifier, e.g. `skills` or `freeform`.
    pub fn source_id(&self) -> &str {
        match self {
            ChunkOrigin::Fielded { name, .. } => name,
            ChunkOrigin::Freeform { .. } => "freeform",
        }
    }
}

impl fmt::Display for ChunkOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkOrigin::Fielded { name, part: 0 } => write!(f, "{name}"),
            ChunkOrigin::Fielded { name, part } => write!(f, "{name} (part {})", part + 1),
            ChunkOrigin::Freeform { window_index } => write!(f, "window {window_index}"),
        }
    }
}

/// An immutable unit of retrievable text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// The text that gets embedded and handed to the model as context.
    pub text: String,
    /// Back-reference to the originating section or window.
    pub origin: ChunkOrigin,
    /// Extra string-valued metadata supplied by the caller.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl DocumentChunk {
    /// Create a chunk with no extra metadata.
    pub fn new(text: impl Into<String>, origin: ChunkOrigin) -> Self {
        Self { text: text.into(), origin, extra: BTreeMap::new() }
    }

    /// Attach an extra metadata pair.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Flatten origin and extra metadata into one string map.
    pub fn metadata(&self) -> BTreeMap<String, String> {
        let mut metadata = self.extra.clone();
        metadata.insert("source".to_string(), self.origin.source_id().to_string());
        match &self.origin {
            ChunkOrigin::Fielded { part, .. } => {
                metadata.insert("part".to_string(), part.to_string());
            }
            ChunkOrigin::Freeform { window_index } => {
                metadata.insert("window_index".to_string(), window_index.to_string());
            }
        }
        metadata
    }
}

/// Opaque identifier assigned to an entry when it is inserted into the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub(crate) u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry-{}", self.0)
    }
}

/// A chunk paired with its embedding, as handed to the index.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    pub chunk: DocumentChunk,
    pub embedding: Vec<f32>,
}

/// A retrieved chunk paired with its cosine similarity to the query.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// The index entry that matched.
    pub entry_id: EntryId,
    /// The retrieved chunk.
    pub chunk: DocumentChunk,
    /// Cosine similarity, higher is more relevant.
    pub score: f32,
}

/// Results ordered by descending score, at most `k` long.
pub type QueryResult = Vec<SearchResult>;
