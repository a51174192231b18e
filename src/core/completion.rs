//! # Aggregate completion tracking
//!
//! [`CompletionTracker`] collects one [`Completion`] per registered stream and
//! resolves once all of them resolved.
//!
//! ## Architecture
//! ```text
//! track(node, completion) ──► pending ─┐
//!                                      │ wait_all(): drain a round
//!                                      ▼
//!                             try_join_all(round) ── Err(first fault) ──► sealed, Err
//!                                      │ Ok
//!                                      ▼
//!                         pending empty? ── no ──► next round
//!                                      │ yes
//!                                      ▼
//!                                 sealed, Ok
//! ```
//!
//! ## Rules
//! - Registrations made while a round is in flight join the next round.
//! - The first fault wins; the remaining completions of that round are dropped.
//! - After sealing, `track` rejects the registration with
//!   [`RuntimeError::LateRegistration`] and remembers the node.
//! - A registered completion that never resolves keeps the aggregate pending
//!   forever. That is a pipeline-authoring error, not something the tracker
//!   can detect.

use futures::future::try_join_all;
use parking_lot::Mutex;

use crate::error::{PushError, RuntimeError};
use crate::operators::Completion;

struct TrackerState {
    pending: Vec<Completion>,
    sealed: bool,
    late: Vec<String>,
}

/// Aggregate wait set of an execution scope.
pub struct CompletionTracker {
    state: Mutex<TrackerState>,
}

impl Default for CompletionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionTracker {
    /// Creates an empty, unsealed tracker.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TrackerState {
                pending: Vec::new(),
                sealed: false,
                late: Vec::new(),
            }),
        }
    }

    /// Adds `completion` to the wait set on behalf of `node`.
    pub fn track(&self, node: &str, completion: Completion) -> Result<(), RuntimeError> {
        let mut state = self.state.lock();
        if state.sealed {
            state.late.push(node.to_string());
            return Err(RuntimeError::LateRegistration {
                node: node.to_string(),
            });
        }
        state.pending.push(completion);
        Ok(())
    }

    /// Waits for every registered completion, round after round.
    ///
    /// Seals the tracker when it returns, whatever the outcome.
    pub async fn wait_all(&self) -> Result<(), PushError> {
        loop {
            let round = {
                let mut state = self.state.lock();
                if state.pending.is_empty() {
                    state.sealed = true;
                    return Ok(());
                }
                std::mem::take(&mut state.pending)
            };
            tracing::debug!(streams = round.len(), "waiting for completion round");

            if let Err(error) = try_join_all(round).await {
                let mut state = self.state.lock();
                state.sealed = true;
                state.pending.clear();
                return Err(error);
            }
        }
    }

    /// Number of completions registered but not yet awaited.
    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Returns true once [`wait_all`](Self::wait_all) returned.
    pub fn is_sealed(&self) -> bool {
        self.state.lock().sealed
    }

    /// Nodes that tried to register after sealing.
    pub fn late_registrations(&self) -> Vec<String> {
        self.state.lock().late.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::completion;
    use crate::push::PushSubject;

    #[tokio::test]
    async fn test_resolves_after_every_registration() {
        let tracker = CompletionTracker::new();
        let a = PushSubject::<i32>::new();
        let b = PushSubject::<i32>::new();
        tracker.track("a", completion(&a)).unwrap();
        tracker.track("b", completion(&b)).unwrap();
        assert_eq!(tracker.pending(), 2);

        a.complete();
        let waiter = tokio::spawn({
            let b = b.clone();
            async move {
                tokio::task::yield_now().await;
                b.complete();
            }
        });
        assert_eq!(tracker.wait_all().await, Ok(()));
        waiter.await.unwrap();
        assert!(tracker.is_sealed());
    }

    #[tokio::test]
    async fn test_first_fault_wins() {
        let tracker = CompletionTracker::new();
        let never = PushSubject::<i32>::new();
        let broken = PushSubject::<i32>::new();
        tracker.track("never", completion(&never)).unwrap();
        tracker.track("broken", completion(&broken)).unwrap();

        broken.fault(PushError::fail("bad row"));
        assert_eq!(tracker.wait_all().await, Err(PushError::fail("bad row")));
        assert!(tracker.is_sealed());
    }

    #[tokio::test]
    async fn test_registration_during_wait_joins_next_round() {
        let tracker = std::sync::Arc::new(CompletionTracker::new());
        let first = PushSubject::<i32>::new();
        let second = PushSubject::<i32>::new();
        tracker.track("first", completion(&first)).unwrap();

        let t = tracker.clone();
        let (f, s) = (first.clone(), second.clone());
        let driver = tokio::spawn(async move {
            t.track("second", completion(&s)).unwrap();
            f.complete();
            tokio::task::yield_now().await;
            s.complete();
        });

        assert_eq!(tracker.wait_all().await, Ok(()));
        driver.await.unwrap();
        assert!(second.is_terminated());
    }

    #[tokio::test]
    async fn test_late_registration_is_rejected() {
        let tracker = CompletionTracker::new();
        assert_eq!(tracker.wait_all().await, Ok(()));

        let late = PushSubject::<i32>::new();
        let err = tracker.track("job/late", completion(&late)).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::LateRegistration {
                node: "job/late".into()
            }
        );
        assert_eq!(tracker.late_registrations(), vec!["job/late".to_string()]);
    }
}
