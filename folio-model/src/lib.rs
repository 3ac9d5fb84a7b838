//! # folio-model
//!
//! Grounded answer generation for the Folio portfolio assistant.
//!
//! ## Overview
//!
//! - [`GenerationClient`] builds a grounded [`Prompt`] from the question and
//!   retrieved [`ContextPassage`]s, then tries model candidates in priority
//!   order until one answers
//! - [`CandidateHealth`] is the shared per-candidate `unknown`/`healthy`/`failed`
//!   state; failures cool down and reset on their own
//! - [`LlmBackend`] is the seam for providers; [`openai::OpenAICompatibleBackend`]
//!   covers OpenAI, Groq and other compatible servers, [`MockLlm`] is for tests
//!
//! ## Features
//!
//! - `openai` (default): the OpenAI-compatible HTTP backend

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod health;
pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;
pub mod prompt;

pub use backend::{CompletionRequest, LlmBackend};
pub use client::{GenerationClient, GenerationClientBuilder, GenerationResult, ProbeOutcome};
pub use config::{GenerationConfig, GenerationConfigBuilder};
pub use error::{BackendError, CandidateFailure, FailureKind, GenerationError, Result};
pub use health::{CandidateHealth, CandidateStatus, HealthState};
pub use mock::{MockLlm, MockReply};
#[cfg(feature = "openai")]
pub use openai::{OpenAICompatibleBackend, OpenAICompatibleConfig};
pub use prompt::{ContextPassage, Prompt};
