//! # Deferred, optionally gated generators
//!
//! [`DeferredPushObservable`] wraps a generator callback that pushes a finite
//! sequence. The callback is not invoked until the first subscription (or an
//! explicit [`start`](DeferredPushObservable::start)).
//!
//! ## Execution
//! ```text
//! first subscribe()/start()
//!   ├─ no gate ─► generator runs inline on the subscribing thread
//!   │             (only observers attached so far see its values)
//!   └─ gate    ─► tokio::spawn(async { gate.wait().await; generator })
//!                 (every observer attached before release sees all values)
//!
//! generator returns Ok(())  ─► complete()
//! generator returns Err(e)  ─► fault(e)
//! generator panics          ─► fault(PushError::Panicked)
//! ```
//!
//! A gated generator started outside a tokio runtime faults with
//! [`PushError::NoRuntime`].
//!
//! [`hold_start`](PushObservable::hold_start) turns off the start on first
//! subscription; the returned [`Starter`] is then the only way to run the
//! generator. Execution contexts hold every generator wrapped in a stream and
//! start them when the job executes.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{Observer, PushObservable, PushSubject, StartGate, Starter, Subscription};
use crate::error::PushError;

/// Generator callback: receives a `push` function and returns how it ended.
pub type Generator<T> = Box<dyn FnOnce(&dyn Fn(T)) -> Result<(), PushError> + Send>;

/// Push source whose generator runs once, on first subscription.
///
/// # Example
/// ```
/// use std::sync::{Arc, Mutex};
/// use pushflow::{DeferredPushObservable, FnObserver, PushObservable};
///
/// let source = DeferredPushObservable::new(
///     |push: &dyn Fn(u8)| {
///         push(1);
///         push(2);
///         Ok(())
///     },
///     None,
/// );
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// source.subscribe(FnObserver::new(move |v: &u8| sink.lock().unwrap().push(*v)).arc());
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
/// ```
pub struct DeferredPushObservable<T> {
    inner: Arc<DeferredInner<T>>,
}

struct DeferredInner<T> {
    subject: PushSubject<T>,
    generator: Mutex<Option<Generator<T>>>,
    gate: Option<StartGate>,
    held: AtomicBool,
}

impl<T: Send + 'static> DeferredPushObservable<T> {
    /// Creates a deferred source; `gate` (if any) must be released before the
    /// generator pushes anything.
    pub fn new(
        generator: impl FnOnce(&dyn Fn(T)) -> Result<(), PushError> + Send + 'static,
        gate: Option<StartGate>,
    ) -> Self {
        Self {
            inner: Arc::new(DeferredInner {
                subject: PushSubject::new(),
                generator: Mutex::new(Some(Box::new(generator))),
                gate,
                held: AtomicBool::new(false),
            }),
        }
    }

    /// Starts the generator if it has not run yet. Idempotent.
    pub fn start(&self) {
        self.inner.start();
    }

    /// Returns true once the generator has been handed off for execution.
    pub fn is_started(&self) -> bool {
        self.inner.generator.lock().is_none()
    }
}

impl<T: Send + 'static> DeferredInner<T> {
    fn start(&self) {
        let Some(generator) = self.generator.lock().take() else {
            return;
        };
        let subject = self.subject.clone();

        match &self.gate {
            None => run_generator(generator, &subject),
            Some(gate) => match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let gate = gate.clone();
                    handle.spawn(async move {
                        gate.wait().await;
                        run_generator(generator, &subject);
                    });
                }
                Err(_) => {
                    tracing::warn!("gated generator started outside a tokio runtime");
                    subject.fault(PushError::NoRuntime);
                }
            },
        }
    }
}

impl<T: Send + 'static> PushObservable<T> for DeferredPushObservable<T> {
    fn subscribe(&self, observer: Arc<dyn Observer<T>>) -> Subscription {
        let subscription = self.inner.subject.subscribe(observer);
        if !self.inner.held.load(Ordering::Acquire) {
            self.inner.start();
        }
        subscription
    }

    fn hold_start(&self) -> Option<Starter> {
        self.inner.held.store(true, Ordering::Release);
        let inner = Arc::clone(&self.inner);
        Some(Box::new(move || inner.start()))
    }
}

impl<T> fmt::Debug for DeferredPushObservable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredPushObservable")
            .field("subject", &self.inner.subject)
            .field("gated", &self.inner.gate.is_some())
            .field("held", &self.inner.held.load(Ordering::Acquire))
            .finish()
    }
}

fn run_generator<T>(generator: Generator<T>, subject: &PushSubject<T>) {
    let push = |value: T| {
        subject.push_value(value);
    };
    match panic::catch_unwind(AssertUnwindSafe(|| generator(&push))) {
        Ok(Ok(())) => {
            subject.complete();
        }
        Ok(Err(error)) => {
            subject.fault(error);
        }
        Err(payload) => {
            subject.fault(PushError::from_panic(payload.as_ref()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Recorder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_generator_waits_for_first_subscription() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let source = DeferredPushObservable::new(
            move |push: &dyn Fn(i32)| {
                c.fetch_add(1, Ordering::SeqCst);
                push(5);
                Ok(())
            },
            None,
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!source.is_started());

        let rec = Recorder::new();
        source.subscribe(rec.clone());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(rec.values(), vec![5]);
        assert_eq!(rec.completions(), 1);

        // Second subscriber: generator does not run again, source is complete.
        let late = Recorder::new();
        source.subscribe(late.clone());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(late.values().is_empty());
        assert_eq!(late.completions(), 1);
    }

    #[test]
    fn test_generator_error_and_panic_fault_the_source() {
        let failing = DeferredPushObservable::<i32>::new(|_| Err(PushError::fail("io")), None);
        let rec = Recorder::new();
        failing.subscribe(rec.clone());
        assert_eq!(rec.errors(), vec![PushError::fail("io")]);

        let panicking =
            DeferredPushObservable::<i32>::new(|_| panic!("generator exploded"), None);
        let rec = Recorder::new();
        panicking.subscribe(rec.clone());
        assert_eq!(
            rec.errors(),
            vec![PushError::Panicked {
                info: "generator exploded".into()
            }]
        );
    }

    #[test]
    fn test_gated_generator_without_runtime_faults() {
        let source = DeferredPushObservable::<i32>::new(|_| Ok(()), Some(StartGate::new()));
        let rec = Recorder::new();
        source.subscribe(rec.clone());
        assert_eq!(rec.errors(), vec![PushError::NoRuntime]);
    }

    #[test]
    fn test_held_generator_runs_only_through_its_starter() {
        let source = DeferredPushObservable::new(
            |push: &dyn Fn(i32)| {
                push(7);
                Ok(())
            },
            None,
        );
        let start = source.hold_start().unwrap();
        let rec = Recorder::new();
        source.subscribe(rec.clone());
        assert!(!source.is_started());
        assert!(rec.values().is_empty());

        start();
        assert_eq!(rec.values(), vec![7]);
        assert_eq!(rec.completions(), 1);
    }

    #[tokio::test]
    async fn test_gate_holds_generator_until_release() {
        let gate = StartGate::new();
        let source = DeferredPushObservable::new(
            |push: &dyn Fn(i32)| {
                push(1);
                push(2);
                Ok(())
            },
            Some(gate.clone()),
        );
        let first = Recorder::new();
        let second = Recorder::new();
        source.subscribe(first.clone());
        tokio::task::yield_now().await;
        source.subscribe(second.clone());
        assert!(first.values().is_empty());

        let done = crate::operators::completion(&source);
        gate.release();
        done.await.unwrap();

        assert_eq!(first.values(), vec![1, 2]);
        assert_eq!(second.values(), vec![1, 2]);
    }
}
