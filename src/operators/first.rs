//! # First
//!
//! [`FirstSubject`] forwards the first value of its input, completes, and
//! detaches from the input. An input that completes without a value completes
//! the output empty; a fault before the first value is forwarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::PushError;
use crate::push::{Observer, PushObservable, PushSubject, Subscription};

struct FirstShared<T> {
    subject: PushSubject<T>,
    taken: AtomicBool,
    upstream: Mutex<Option<Subscription>>,
}

impl<T> FirstShared<T> {
    fn detach(&self) {
        if let Some(upstream) = self.upstream.lock().take() {
            upstream.unsubscribe();
        }
    }
}

struct FirstObserver<T> {
    shared: Arc<FirstShared<T>>,
}

impl<T> Observer<T> for FirstObserver<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn on_next(&self, value: &T) {
        if self.shared.taken.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shared.subject.push_value(value.clone());
        self.shared.subject.complete();
        self.shared.detach();
    }

    fn on_completed(&self) {
        self.shared.subject.complete();
    }

    fn on_error(&self, error: &PushError) {
        self.shared.subject.fault(error.clone());
    }
}

/// Output of [`first`].
pub struct FirstSubject<T> {
    shared: Arc<FirstShared<T>>,
}

impl<T: Clone + Send + Sync + 'static> FirstSubject<T> {
    /// Subscribes to `source`.
    pub fn new(source: &dyn PushObservable<T>) -> Self {
        let shared = Arc::new(FirstShared {
            subject: PushSubject::new(),
            taken: AtomicBool::new(false),
            upstream: Mutex::new(None),
        });
        let upstream = source.subscribe(Arc::new(FirstObserver {
            shared: Arc::clone(&shared),
        }));
        // The input may have produced its first value while subscribing.
        if shared.taken.load(Ordering::Acquire) {
            upstream.unsubscribe();
        } else {
            *shared.upstream.lock() = Some(upstream);
        }
        Self { shared }
    }

    /// Returns true once the first value went through.
    pub fn is_taken(&self) -> bool {
        self.shared.taken.load(Ordering::Acquire)
    }
}

impl<T: 'static> PushObservable<T> for FirstSubject<T> {
    fn subscribe(&self, observer: Arc<dyn Observer<T>>) -> Subscription {
        self.shared.subject.subscribe(observer)
    }
}

/// Forwards only the first value of `source`.
pub fn first<T: Clone + Send + Sync + 'static>(source: &dyn PushObservable<T>) -> FirstSubject<T> {
    FirstSubject::new(source)
}
