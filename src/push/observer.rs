//! # Observer contract
//!
//! An [`Observer`] receives values by reference and at most one terminal
//! signal. [`FnObserver`] is the closure-backed implementation used by tests,
//! sinks and small adapters.

use std::fmt;
use std::sync::Arc;

use crate::error::PushError;

type NextFn<T> = Box<dyn Fn(&T) + Send + Sync>;
type CompletedFn = Box<dyn Fn() + Send + Sync>;
type ErrorFn = Box<dyn Fn(&PushError) + Send + Sync>;

/// # Receiver of pushed values.
///
/// Called synchronously on the producer's thread. Implementations must not
/// block for long: every other observer of the same source waits behind them.
pub trait Observer<T>: Send + Sync {
    /// Handles one value.
    fn on_next(&self, value: &T);

    /// Handles successful termination of the source.
    fn on_completed(&self) {}

    /// Handles fault termination of the source.
    fn on_error(&self, error: &PushError) {
        let _ = error;
    }
}

/// Closure-backed [`Observer`].
///
/// # Example
/// ```
/// use std::sync::{Arc, Mutex};
/// use pushflow::{FnObserver, PushObservable, PushSubject};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// let subject = PushSubject::new();
/// subject.subscribe(FnObserver::new(move |v: &i32| sink.lock().unwrap().push(*v)).arc());
///
/// subject.push_value(1);
/// subject.push_value(2);
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
/// ```
pub struct FnObserver<T> {
    next: NextFn<T>,
    completed: Option<CompletedFn>,
    error: Option<ErrorFn>,
}

impl<T> FnObserver<T> {
    /// Creates an observer that only handles values.
    pub fn new(next: impl Fn(&T) + Send + Sync + 'static) -> Self {
        Self {
            next: Box::new(next),
            completed: None,
            error: None,
        }
    }

    /// Attaches a completion handler.
    pub fn with_completed(mut self, completed: impl Fn() + Send + Sync + 'static) -> Self {
        self.completed = Some(Box::new(completed));
        self
    }

    /// Attaches a fault handler.
    pub fn with_error(mut self, error: impl Fn(&PushError) + Send + Sync + 'static) -> Self {
        self.error = Some(Box::new(error));
        self
    }

    /// Wraps the observer into a shared handle ready for `subscribe`.
    pub fn arc(self) -> Arc<dyn Observer<T>>
    where
        T: 'static,
    {
        Arc::new(self)
    }
}

impl<T> Observer<T> for FnObserver<T> {
    fn on_next(&self, value: &T) {
        (self.next)(value);
    }

    fn on_completed(&self) {
        if let Some(completed) = &self.completed {
            completed();
        }
    }

    fn on_error(&self, error: &PushError) {
        if let Some(handler) = &self.error {
            handler(error);
        }
    }
}

impl<T> fmt::Debug for FnObserver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnObserver")
            .field("completed", &self.completed.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}
