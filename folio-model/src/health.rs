//! Process-wide health state for model candidates.
//!
//! [`CandidateHealth`] is created once when the generation client is built
//! and shared by every concurrent call. Each candidate has its own slot
//! behind its own lock, so updates to different candidates never contend.
//! A `failed` mark expires lazily: the first read after the cooldown resets
//! the slot to `unknown`.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::info;

/// Observable health of a model candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    /// Not tried yet, or a failure cooldown has expired.
    Unknown,
    /// The last call succeeded.
    Healthy,
    /// The last call failed and the cooldown has not elapsed.
    Failed,
}

#[derive(Debug)]
struct Slot {
    state: HealthState,
    failed_until: Option<Instant>,
    last_error: Option<String>,
}

impl Slot {
    /// Reset an expired failure. Returns the remaining cooldown otherwise.
    fn refresh(&mut self, id: &str, now: Instant) -> Option<Duration> {
        match self.failed_until {
            Some(until) if until > now => Some(until - now),
            Some(_) => {
                self.state = HealthState::Unknown;
                self.failed_until = None;
                info!(candidate = id, "candidate cooldown expired");
                None
            }
            None => None,
        }
    }
}

/// Point-in-time view of one candidate, as reported by health checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateStatus {
    pub id: String,
    pub state: HealthState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Shared, mutable health of every candidate, in priority order.
#[derive(Debug)]
pub struct CandidateHealth {
    ids: Vec<String>,
    slots: Vec<Mutex<Slot>>,
    cooldown: Duration,
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    // Health is best-effort; a panic elsewhere must not wedge generation.
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CandidateHealth {
    /// Start every candidate in [`HealthState::Unknown`].
    pub fn new(ids: Vec<String>, cooldown: Duration) -> Self {
        let slots = ids
            .iter()
            .map(|_| Mutex::new(Slot { state: HealthState::Unknown, failed_until: None, last_error: None }))
            .collect();
        Self { ids, slots, cooldown }
    }

    /// The failure cooldown applied by [`mark_failed`](Self::mark_failed).
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Candidate identifiers in priority order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Current state of candidate `index`, expiring a stale failure first.
    pub(crate) fn state(&self, index: usize) -> HealthState {
        let mut slot = lock(&self.slots[index]);
        slot.refresh(&self.ids[index], Instant::now());
        slot.state
    }

    /// `Ok` if candidate `index` may be tried now, else the cooldown left.
    pub(crate) fn check_available(&self, index: usize) -> Result<(), Duration> {
        let mut slot = lock(&self.slots[index]);
        match slot.refresh(&self.ids[index], Instant::now()) {
            Some(remaining) => Err(remaining),
            None => Ok(()),
        }
    }

    /// Record a successful call.
    pub(crate) fn mark_healthy(&self, index: usize) {
        let mut slot = lock(&self.slots[index]);
        slot.state = HealthState::Healthy;
        slot.failed_until = None;
        slot.last_error = None;
    }

    /// Record a failed call and start the cooldown.
    pub(crate) fn mark_failed(&self, index: usize, reason: impl Into<String>) {
        let mut slot = lock(&self.slots[index]);
        slot.state = HealthState::Failed;
        slot.failed_until = Some(Instant::now() + self.cooldown);
        slot.last_error = Some(reason.into());
    }

    /// Current state of the candidate named `id`, or `None` if there is no such candidate.
    pub fn state_of(&self, id: &str) -> Option<HealthState> {
        let index = self.ids.iter().position(|known| known == id)?;
        Some(self.state(index))
    }

    /// Status of every candidate, in priority order.
    pub fn snapshot(&self) -> Vec<CandidateStatus> {
        let now = Instant::now();
        self.ids
            .iter()
            .zip(&self.slots)
            .map(|(id, slot)| {
                let mut slot = lock(slot);
                slot.refresh(id, now);
                CandidateStatus { id: id.clone(), state: slot.state, last_error: slot.last_error.clone() }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn health() -> CandidateHealth {
        CandidateHealth::new(vec!["a".into(), "b".into()], Duration::from_secs(10))
    }

    #[tokio::test(start_paused = true)]
    async fn failure_expires_after_cooldown() {
        let health = health();
        health.mark_failed(0, "timeout");
        assert_eq!(health.state(0), HealthState::Failed);
        assert!(health.check_available(0).is_err());

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(health.state(0), HealthState::Unknown);
        assert!(health.check_available(0).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn success_clears_failure() {
        let health = health();
        health.mark_failed(1, "boom");
        health.mark_healthy(1);

        let snapshot = health.snapshot();
        assert_eq!(snapshot[0].state, HealthState::Unknown);
        assert_eq!(snapshot[1].state, HealthState::Healthy);
        assert_eq!(snapshot[1].last_error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_by_id_tolerates_unknown_candidates() {
        let health = health();
        health.mark_failed(1, "boom");
        assert_eq!(health.state_of("b"), Some(HealthState::Failed));
        assert_eq!(health.state_of("a"), Some(HealthState::Unknown));
        assert_eq!(health.state_of("missing"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn remaining_cooldown_is_reported() {
        let health = health();
        health.mark_failed(0, "boom");
        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(health.check_available(0), Err(Duration::from_secs(6)));
    }
}
