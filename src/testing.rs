//! Shared helpers for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::PushError;
use crate::push::Observer;

/// Records everything an observer receives, in order.
pub(crate) struct Recorder<T> {
    values: Mutex<Vec<T>>,
    completed: AtomicUsize,
    errors: Mutex<Vec<PushError>>,
}

impl<T: Clone> Recorder<T> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            values: Mutex::new(Vec::new()),
            completed: AtomicUsize::new(0),
            errors: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn values(&self) -> Vec<T> {
        self.values.lock().clone()
    }

    pub(crate) fn completions(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub(crate) fn errors(&self) -> Vec<PushError> {
        self.errors.lock().clone()
    }
}

impl<T: Clone + Send + Sync> Observer<T> for Recorder<T> {
    fn on_next(&self, value: &T) {
        self.values.lock().push(value.clone());
    }

    fn on_completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_error(&self, error: &PushError) {
        self.errors.lock().push(error.clone());
    }
}
