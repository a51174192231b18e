//! # Merge
//!
//! [`MergeSubject`] fans N inputs into one output.
//!
//! ## Rules
//! - Every value from any input is forwarded as it arrives; each input's own
//!   values keep their relative order, nothing more is promised across inputs.
//! - Completes only after **all** inputs completed (zero inputs → completes at once).
//! - The first fault faults the output and detaches every input (fail-fast).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::PushError;
use crate::push::{Observer, PushObservable, PushSubject, Subscription};

struct MergeShared<T> {
    subject: PushSubject<T>,
    remaining: AtomicUsize,
    upstreams: Mutex<Vec<Subscription>>,
}

impl<T> MergeShared<T> {
    fn detach_all(&self) {
        let upstreams = std::mem::take(&mut *self.upstreams.lock());
        for upstream in &upstreams {
            upstream.unsubscribe();
        }
    }
}

struct MergeObserver<T> {
    shared: Arc<MergeShared<T>>,
}

impl<T: Clone + Send + Sync + 'static> Observer<T> for MergeObserver<T> {
    fn on_next(&self, value: &T) {
        self.shared.subject.push_value(value.clone());
    }

    fn on_completed(&self) {
        if self.shared.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.shared.subject.complete();
        }
    }

    fn on_error(&self, error: &PushError) {
        if self.shared.subject.fault(error.clone()) {
            self.shared.detach_all();
        }
    }
}

/// Output of [`merge`].
pub struct MergeSubject<T> {
    shared: Arc<MergeShared<T>>,
}

impl<T: Clone + Send + Sync + 'static> MergeSubject<T> {
    /// Subscribes to every source in order.
    pub fn new(sources: &[&dyn PushObservable<T>]) -> Self {
        let shared = Arc::new(MergeShared {
            subject: PushSubject::new(),
            remaining: AtomicUsize::new(sources.len()),
            upstreams: Mutex::new(Vec::with_capacity(sources.len())),
        });
        if sources.is_empty() {
            shared.subject.complete();
        }

        for source in sources {
            if shared.subject.is_terminated() {
                break;
            }
            let upstream = source.subscribe(Arc::new(MergeObserver {
                shared: Arc::clone(&shared),
            }));
            shared.upstreams.lock().push(upstream);
        }

        // An input may have faulted synchronously while we were still subscribing.
        if shared.subject.is_terminated() {
            shared.detach_all();
        }
        Self { shared }
    }
}

impl<T: 'static> PushObservable<T> for MergeSubject<T> {
    fn subscribe(&self, observer: Arc<dyn Observer<T>>) -> Subscription {
        self.shared.subject.subscribe(observer)
    }
}

/// Merges `sources` into one push source.
pub fn merge<T: Clone + Send + Sync + 'static>(sources: &[&dyn PushObservable<T>]) -> MergeSubject<T> {
    MergeSubject::new(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Recorder;

    #[test]
    fn test_forwards_values_from_every_input() {
        let a = PushSubject::<i32>::new();
        let b = PushSubject::<i32>::new();
        let merged = merge::<i32>(&[&a, &b]);
        let rec = Recorder::new();
        merged.subscribe(rec.clone());

        a.push_value(1);
        b.push_value(10);
        a.push_value(2);
        assert_eq!(rec.values(), vec![1, 10, 2]);
    }

    #[test]
    fn test_completes_only_after_all_inputs() {
        let a = PushSubject::<i32>::new();
        let b = PushSubject::<i32>::new();
        let merged = merge::<i32>(&[&a, &b]);
        let rec = Recorder::new();
        merged.subscribe(rec.clone());

        a.complete();
        assert_eq!(rec.completions(), 0);
        b.push_value(3);
        b.complete();
        assert_eq!(rec.values(), vec![3]);
        assert_eq!(rec.completions(), 1);
    }

    #[test]
    fn test_fault_is_fail_fast() {
        let a = PushSubject::<i32>::new();
        let b = PushSubject::<i32>::new();
        let merged = merge::<i32>(&[&a, &b]);
        let rec = Recorder::new();
        merged.subscribe(rec.clone());

        b.push_value(1);
        a.fault(PushError::fail("a broke"));
        assert_eq!(rec.errors(), vec![PushError::fail("a broke")]);
        assert_eq!(b.observer_count(), 0, "sibling input must be detached");

        b.push_value(2);
        b.complete();
        assert_eq!(rec.values(), vec![1]);
        assert_eq!(rec.completions(), 0);
    }

    #[test]
    fn test_zero_inputs_complete_immediately() {
        let merged = merge::<i32>(&[]);
        let rec = Recorder::new();
        merged.subscribe(rec.clone());
        assert_eq!(rec.completions(), 1);
    }

    #[test]
    fn test_already_faulted_input_detaches_the_rest() {
        let a = PushSubject::<i32>::new();
        a.fault(PushError::fail("dead on arrival"));
        let b = PushSubject::<i32>::new();
        let merged = merge::<i32>(&[&a, &b]);
        let rec = Recorder::new();
        merged.subscribe(rec.clone());

        assert_eq!(rec.errors(), vec![PushError::fail("dead on arrival")]);
        assert_eq!(b.observer_count(), 0);
    }
}
