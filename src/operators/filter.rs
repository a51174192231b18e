//! # Filter-based operators
//!
//! [`FilterSubject`] forwards a value only when its [`AcceptValue`] predicate
//! accepts it; completion and faults pass through unconditionally.

use std::sync::Arc;

use crate::error::PushError;
use crate::push::{Observer, PushObservable, PushSubject, Subscription};

/// Decides whether a value passes a [`FilterSubject`].
pub trait AcceptValue<T>: Send + Sync + 'static {
    /// Returns true if `value` must be forwarded.
    fn accepts(&self, value: &T) -> bool;
}

/// Closure-backed [`AcceptValue`].
pub struct FnFilter<F>(pub F);

impl<T, F> AcceptValue<T> for FnFilter<F>
where
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    fn accepts(&self, value: &T) -> bool {
        (self.0)(value)
    }
}

/// Output of a filter-based operator.
pub struct FilterSubject<T> {
    subject: PushSubject<T>,
    upstream: Subscription,
}

struct FilterObserver<T, P> {
    predicate: P,
    downstream: PushSubject<T>,
}

impl<T, P> Observer<T> for FilterObserver<T, P>
where
    T: Clone + Send + Sync + 'static,
    P: AcceptValue<T>,
{
    fn on_next(&self, value: &T) {
        if self.predicate.accepts(value) {
            self.downstream.push_value(value.clone());
        }
    }

    fn on_completed(&self) {
        self.downstream.complete();
    }

    fn on_error(&self, error: &PushError) {
        self.downstream.fault(error.clone());
    }
}

impl<T: Clone + Send + Sync + 'static> FilterSubject<T> {
    /// Subscribes to `source` and filters it through `predicate`.
    pub fn new<P: AcceptValue<T>>(source: &dyn PushObservable<T>, predicate: P) -> Self {
        let subject = PushSubject::new();
        let upstream = source.subscribe(Arc::new(FilterObserver {
            predicate,
            downstream: subject.clone(),
        }));
        Self { subject, upstream }
    }

    /// Detaches from the input; the output will not terminate on its own afterwards.
    pub fn detach(&self) {
        self.upstream.unsubscribe();
    }
}

impl<T: 'static> PushObservable<T> for FilterSubject<T> {
    fn subscribe(&self, observer: Arc<dyn Observer<T>>) -> Subscription {
        self.subject.subscribe(observer)
    }
}

/// Forwards the values of `source` for which `predicate` returns true.
pub fn filter<T, F>(source: &dyn PushObservable<T>, predicate: F) -> FilterSubject<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    FilterSubject::new(source, FnFilter(predicate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Recorder;

    #[test]
    fn test_filter_forwards_accepted_values_and_terminal() {
        let source = PushSubject::<i32>::new();
        let evens = filter(&source, |v| v % 2 == 0);
        let rec = Recorder::new();
        evens.subscribe(rec.clone());

        for v in 1..=6 {
            source.push_value(v);
        }
        source.complete();

        assert_eq!(rec.values(), vec![2, 4, 6]);
        assert_eq!(rec.completions(), 1);
    }

    #[test]
    fn test_filter_forwards_fault() {
        let source = PushSubject::<i32>::new();
        let out = filter(&source, |_| false);
        let rec = Recorder::new();
        out.subscribe(rec.clone());

        source.fault(PushError::fail("upstream"));
        assert_eq!(rec.errors(), vec![PushError::fail("upstream")]);
    }

    #[test]
    fn test_detach_stops_forwarding() {
        let source = PushSubject::<i32>::new();
        let out = filter(&source, |_| true);
        let rec = Recorder::new();
        out.subscribe(rec.clone());

        source.push_value(1);
        out.detach();
        source.push_value(2);
        assert_eq!(rec.values(), vec![1]);
        assert_eq!(source.observer_count(), 0);
    }
}
