//! # Subscription handle
//!
//! [`Subscription`] detaches one observer from its source. Unsubscribing is the
//! cancellation primitive of the engine:
//! - idempotent, safe from any thread,
//! - safe re-entrantly from inside a delivery callback,
//! - after it returns, no further value reaches the observer.
//!
//! Dropping a handle does **not** unsubscribe; call [`Subscription::unsubscribe`]
//! or register the handle with a [`DisposableRegistry`](crate::DisposableRegistry).

use std::fmt;

use parking_lot::Mutex;

type Detach = Box<dyn FnOnce() + Send>;

/// Handle returned by [`PushObservable::subscribe`](crate::PushObservable::subscribe).
pub struct Subscription {
    detach: Mutex<Option<Detach>>,
}

impl Subscription {
    /// Creates a handle running `detach` on the first `unsubscribe`.
    pub fn new(detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            detach: Mutex::new(Some(Box::new(detach))),
        }
    }

    /// A handle with nothing to detach (terminated source).
    pub fn empty() -> Self {
        Self {
            detach: Mutex::new(None),
        }
    }

    /// Groups several handles; unsubscribing detaches all of them in order.
    pub fn from_many(subscriptions: Vec<Subscription>) -> Self {
        Self::new(move || {
            for subscription in &subscriptions {
                subscription.unsubscribe();
            }
        })
    }

    /// Detaches the observer. Subsequent calls are no-ops.
    pub fn unsubscribe(&self) {
        let detach = self.detach.lock().take();
        if let Some(detach) = detach {
            detach();
        }
    }

    /// Returns true once the handle has nothing left to detach.
    pub fn is_closed(&self) -> bool {
        self.detach.lock().is_none()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_unsubscribe_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let sub = Subscription::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert!(!sub.is_closed());
        sub.unsubscribe();
        sub.unsubscribe();
        assert!(sub.is_closed());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_many_detaches_all() {
        let calls = Arc::new(AtomicUsize::new(0));
        let parts = (0..3)
            .map(|_| {
                let c = calls.clone();
                Subscription::new(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();
        let all = Subscription::from_many(parts);
        all.unsubscribe();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_empty_is_closed() {
        let sub = Subscription::empty();
        assert!(sub.is_closed());
        sub.unsubscribe();
    }
}
