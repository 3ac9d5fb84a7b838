//! Prompt construction for grounded answers.

use serde::{Deserialize, Serialize};

/// Instructions sent as the system message on every generation.
pub const INSTRUCTIONS: &str = "\
You are the assistant of a personal portfolio. Answer questions about the portfolio owner.

Rules:
1. Answer ONLY from the portfolio context provided by the user message.
2. If the context does not contain the answer, say plainly that the portfolio does not include that information.
3. Never invent facts that are not in the context.
4. Reply in the same language and register as the question.
5. Be concise but informative, and vary your wording.
6. Give the final answer only. Do not repeat the context or the question.";

/// A retrieved excerpt handed to the model as context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextPassage {
    /// Where the excerpt came from, e.g. a section name. Shown to the model for traceability.
    pub source: Option<String>,
    pub text: String,
}

impl ContextPassage {
    /// A passage with a source label.
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self { source: Some(source.into()), text: text.into() }
    }

    /// A passage without a source label.
    pub fn unlabeled(text: impl Into<String>) -> Self {
        Self { source: None, text: text.into() }
    }
}

/// A system + user message pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    /// Build the grounded-answer prompt for `query` over `context`, keeping context order.
    pub fn grounded(query: &str, context: &[ContextPassage]) -> Self {
        let passages = context
            .iter()
            .map(|p| match &p.source {
                Some(source) => format!("[{source}]\n{}", p.text.trim()),
                None => p.text.trim().to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let user = format!(
            "Portfolio context:\n{passages}\n\nQuestion: {}\n\nAnswer:",
            query.trim()
        );
        Self { system: INSTRUCTIONS.to_string(), user }
    }

    /// A minimal prompt used to check that a candidate responds at all.
    pub fn probe() -> Self {
        Self {
            system: "Reply with the single word OK.".to_string(),
            user: "ping".to_string(),
        }
    }
}
