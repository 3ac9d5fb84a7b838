//! # folio-assistant
//!
//! Question answering over a personal portfolio document.
//!
//! [`PortfolioAssistant`] ties the retrieval pipeline from `folio-rag` to the
//! fallback generation client from `folio-model`:
//!
//! - `ingest` chunks and indexes the portfolio, replacing the previous one atomically
//! - `answer` retrieves the most relevant excerpts and asks the first healthy
//!   model candidate to answer from them
//! - `health` reports embedder, index and per-candidate status
//!
//! The `folio` binary (feature `cli`, on by default) wires it up from
//! environment [`Settings`] with a local embedder and Groq-hosted models.

pub mod assistant;
pub mod error;
pub mod settings;
pub mod telemetry;

pub use assistant::{
    Answer, ComponentStatus, HealthReport, MAX_QUERY_CHARS, PortfolioAssistant,
    PortfolioAssistantBuilder, SOURCE_PREVIEW_CHARS, Source,
};
pub use error::{AssistantError, Result};
pub use settings::Settings;
pub use telemetry::{LogFormat, init_telemetry};
