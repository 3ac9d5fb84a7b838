//! Splitting raw portfolio text into chunks.
//!
//! [`SectionChunker`] picks the first policy that applies:
//!
//! 1. the text is a JSON object: every top-level field is a section
//! 2. the text declares section markers (`# Skills` or `[Skills]` lines)
//! 3. otherwise the text is freeform and is cut into overlapping windows
//!
//! Sections longer than the window size are windowed too, keeping their name.

use std::ops::Range;

use serde_json::Value;

use crate::config::RagConfig;
use crate::document::{ChunkOrigin, DocumentChunk};

/// Section name given to text that precedes the first marker.
pub const PREAMBLE_SECTION: &str = "preamble";

/// A strategy for splitting a raw document into chunks.
///
/// Implementations produce [`DocumentChunk`]s only; embeddings are computed
/// afterwards by the ingestion pipeline.
pub trait Chunker: Send + Sync {
    /// Split a raw document. Returns an empty `Vec` if there is nothing to index.
    fn chunk(&self, raw: &str) -> Vec<DocumentChunk>;
}

/// A named section declared by the document itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub body: String,
}

/// The section-aware chunking policy with a fixed-window fallback.
///
/// # Example
///
/// ```rust,ignore
/// use folio_rag::SectionChunker;
///
/// let chunker = SectionChunker::new(500, 50);
/// let chunks = chunker.chunk(r#"{"skills": "Python, Go"}"#);
/// assert_eq!(chunks[0].text, "skills: Python, Go");
/// ```
#[derive(Debug, Clone)]
pub struct SectionChunker {
    window_size: usize,
    window_overlap: usize,
}

impl SectionChunker {
    /// Create a chunker with window size `W` and overlap `O`.
    ///
    /// `O` is clamped below `W` so windowing always makes progress.
    pub fn new(window_size: usize, window_overlap: usize) -> Self {
        let window_size = window_size.max(1);
        Self { window_size, window_overlap: window_overlap.min(window_size - 1) }
    }

    /// Create a chunker from the pipeline configuration.
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.window_size, config.window_overlap)
    }

    fn chunk_sections(&self, sections: Vec<Section>) -> Vec<DocumentChunk> {
        // Leave at least `O + 1` characters of every window for the body.
        let max_prefix = self.window_size - self.window_overlap - 1;

        let mut chunks = Vec::new();
        for section in sections {
            if section.body.is_empty() {
                // A heading with nothing under it still carries text, e.g. the owner's name.
                chunks.push(DocumentChunk::new(
                    truncate_chars(&section.name, self.window_size),
                    ChunkOrigin::Fielded { name: section.name, part: 0 },
                ));
                continue;
            }

            let label = truncate_chars(&section.name, max_prefix.saturating_sub(2));
            let prefix = if label.is_empty() { String::new() } else { format!("{label}: ") };
            let budget = self.window_size - prefix.chars().count();
            for (part, window) in
                split_windows(&section.body, budget, self.window_overlap).into_iter().enumerate()
            {
                chunks.push(DocumentChunk::new(
                    format!("{prefix}{window}"),
                    ChunkOrigin::Fielded { name: section.name.clone(), part },
                ));
            }
        }
        chunks
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

impl Chunker for SectionChunker {
    fn chunk(&self, raw: &str) -> Vec<DocumentChunk> {
        if raw.trim().is_empty() {
            return Vec::new();
        }

        if let Some(sections) = json_sections(raw).or_else(|| marked_sections(raw)) {
            return self.chunk_sections(sections);
        }

        split_windows(raw, self.window_size, self.window_overlap)
            .into_iter()
            .enumerate()
            .map(|(window_index, text)| {
                DocumentChunk::new(text, ChunkOrigin::Freeform { window_index })
            })
            .collect()
    }
}

/// Interpret `raw` as a JSON object of fields. Returns `None` for anything else.
pub fn json_sections(raw: &str) -> Option<Vec<Section>> {
    let Value::Object(fields) = serde_json::from_str::<Value>(raw.trim()).ok()? else {
        return None;
    };
    Some(
        fields
            .iter()
            .map(|(name, value)| Section { name: name.clone(), body: render_value(value) })
            .filter(|s| !s.body.is_empty())
            .collect(),
    )
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(items) => items
            .iter()
            .map(render_value)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(fields) => fields
            .iter()
            .filter_map(|(key, value)| {
                let rendered = render_value(value);
                if rendered.is_empty() {
                    None
                } else if rendered.contains('\n') {
                    Some(format!("{key}:\n{rendered}"))
                } else {
                    Some(format!("{key}: {rendered}"))
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Parse a section marker line: `# Title` (any level) or `[Title]`.
fn marker_name(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let name = if let Some(rest) = trimmed.strip_prefix('#') {
        let rest = rest.trim_start_matches('#');
        // "#hashtag" is text, "# Title" is a header
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        rest.trim()
    } else if trimmed.starts_with('[') && trimmed.ends_with(']') && trimmed.len() > 2 {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        return None;
    };
    (!name.is_empty()).then_some(name)
}

/// Split `raw` on section marker lines.
///
/// A marker with no text under it is kept as a section with an empty body.
/// Returns `None` if there are no markers or no marker has any text under it.
pub fn marked_sections(raw: &str) -> Option<Vec<Section>> {
    let mut sections = Vec::new();
    let mut current = Section { name: PREAMBLE_SECTION.to_string(), body: String::new() };
    let mut saw_marker = false;

    for line in raw.lines() {
        if let Some(name) = marker_name(line) {
            saw_marker = true;
            let finished =
                std::mem::replace(&mut current, Section { name: name.to_string(), body: String::new() });
            sections.push(finished);
        } else {
            current.body.push_str(line);
            current.body.push('\n');
        }
    }
    sections.push(current);

    if !saw_marker {
        return None;
    }
    let mut sections: Vec<Section> = sections
        .into_iter()
        .map(|s| Section { name: s.name, body: s.body.trim().to_string() })
        .collect();
    // The implicit preamble only counts when there is text before the first marker.
    if sections[0].body.is_empty() {
        sections.remove(0);
    }

    // Markers alone do not make a sectioned document; treat it as freeform text.
    if sections.iter().all(|s| s.body.is_empty()) {
        return None;
    }
    Some(sections)
}

/// Cut `text` into windows of at most `size` characters overlapping by `overlap`.
///
/// A window that does not reach the end of the text is shortened to end at
/// the last whitespace past the overlap, so words are not split when avoidable.
/// Windows are trimmed and blank windows are dropped.
pub fn split_windows(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    spans(&chars, size, overlap)
        .into_iter()
        .filter_map(|span| {
            let window: String = chars[span].iter().collect();
            let window = window.trim();
            (!window.is_empty()).then(|| window.to_string())
        })
        .collect()
}

/// The untrimmed character ranges [`split_windows`] cuts `text` into.
///
/// The ranges start at `0`, end at the text's length, are at most `size`
/// long, and each one starts exactly `overlap` characters before the
/// previous one ends.
pub fn window_spans(text: &str, size: usize, overlap: usize) -> Vec<Range<usize>> {
    let chars: Vec<char> = text.chars().collect();
    spans(&chars, size, overlap)
}

fn spans(chars: &[char], size: usize, overlap: usize) -> Vec<Range<usize>> {
    let size = size.max(1);
    let overlap = overlap.min(size - 1);
    let len = chars.len();

    let mut spans = Vec::new();
    let mut start = 0;
    while start < len {
        let mut end = (start + size).min(len);
        if end < len {
            if let Some(ws) = (start + overlap + 1..end).rev().find(|&i| chars[i].is_whitespace()) {
                end = ws;
            }
        }
        spans.push(start..end);

        if end >= len {
            break;
        }
        start = end - overlap;
    }
    spans
}
