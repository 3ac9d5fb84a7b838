//! Scripted backend for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::backend::{CompletionRequest, LlmBackend};
use crate::error::{BackendError, FailureKind};

/// What a [`MockLlm`] does on a call.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Answer with this text.
    Text(String),
    /// Fail with this kind and message.
    Fail(FailureKind, String),
    /// Never answer; exercises the caller's timeout.
    Hang,
}

/// A mock [`LlmBackend`] that replays scripted replies.
///
/// Queued replies are used first, in order; afterwards every call gets the
/// default reply. Requests are recorded for inspection.
#[derive(Debug)]
pub struct MockLlm {
    id: String,
    default: MockReply,
    script: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<CompletionRequest>>,
    calls: AtomicUsize,
}

impl MockLlm {
    /// A mock that always replies with `default`.
    pub fn new(id: impl Into<String>, default: MockReply) -> Self {
        Self {
            id: id.into(),
            default,
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// A mock that always answers `text`.
    pub fn answering(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, MockReply::Text(text.into()))
    }

    /// A mock that always fails with `kind`.
    pub fn failing(id: impl Into<String>, kind: FailureKind) -> Self {
        Self::new(id, MockReply::Fail(kind, format!("scripted {kind}")))
    }

    /// Queue `reply` ahead of the default.
    pub fn then(self, reply: MockReply) -> Self {
        self.script.lock().unwrap_or_else(|e| e.into_inner()).push_back(reply);
        self
    }

    /// Number of calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl LlmBackend for MockLlm {
    fn model_id(&self) -> &str {
        &self.id
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).push(request.clone());
        let reply = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| self.default.clone());

        match reply {
            MockReply::Text(text) => Ok(text),
            MockReply::Fail(kind, message) => Err(BackendError::new(kind, message)),
            MockReply::Hang => std::future::pending().await,
        }
    }
}
