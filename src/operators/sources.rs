//! Finite deferred generators.
//!
//! All of them return a [`DeferredPushObservable`]: nothing is pushed before
//! the first subscription, and a gated generator additionally waits for its
//! [`StartGate`].

use crate::push::{DeferredPushObservable, StartGate};

/// Pushes `count` consecutive integers starting at `from`, then completes.
///
/// # Example
/// ```
/// use std::sync::{Arc, Mutex};
/// use pushflow::{operators, FnObserver, PushObservable};
///
/// let numbers = operators::range(5, 3, None);
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// numbers.subscribe(FnObserver::new(move |v: &i64| sink.lock().unwrap().push(*v)).arc());
/// assert_eq!(*seen.lock().unwrap(), vec![5, 6, 7]);
/// ```
pub fn range(from: i64, count: usize, gate: Option<StartGate>) -> DeferredPushObservable<i64> {
    DeferredPushObservable::new(
        move |push: &dyn Fn(i64)| {
            (from..).take(count).for_each(push);
            Ok(())
        },
        gate,
    )
}

/// Completes without pushing anything.
pub fn empty<T: Send + 'static>(gate: Option<StartGate>) -> DeferredPushObservable<T> {
    DeferredPushObservable::new(|_: &dyn Fn(T)| Ok(()), gate)
}

/// Pushes every item of `items` in order, then completes.
pub fn from_iter<I>(items: I, gate: Option<StartGate>) -> DeferredPushObservable<I::Item>
where
    I: IntoIterator + Send + 'static,
    I::Item: Send + 'static,
{
    DeferredPushObservable::new(
        move |push: &dyn Fn(I::Item)| {
            items.into_iter().for_each(push);
            Ok(())
        },
        gate,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::completion;
    use crate::push::PushObservable;
    use crate::testing::Recorder;

    #[test]
    fn test_range_counts_from_start() {
        let rec = Recorder::new();
        range(-2, 4, None).subscribe(rec.clone());
        assert_eq!(rec.values(), vec![-2, -1, 0, 1]);
        assert_eq!(rec.completions(), 1);

        let rec = Recorder::new();
        range(0, 0, None).subscribe(rec.clone());
        assert!(rec.values().is_empty());
        assert_eq!(rec.completions(), 1);
    }

    #[test]
    fn test_empty_completes_without_values() {
        let rec = Recorder::<String>::new();
        empty::<String>(None).subscribe(rec.clone());
        assert!(rec.values().is_empty());
        assert_eq!(rec.completions(), 1);
    }

    #[tokio::test]
    async fn test_gated_sources_start_together() {
        let gate = StartGate::new();
        let letters = from_iter(vec!["a", "b"], Some(gate.clone()));
        let numbers = range(1, 2, Some(gate.clone()));
        let seen_letters = Recorder::new();
        let seen_numbers = Recorder::new();
        letters.subscribe(seen_letters.clone());
        numbers.subscribe(seen_numbers.clone());
        let done = futures::future::try_join(completion(&letters), completion(&numbers));

        assert!(seen_letters.values().is_empty());
        gate.release();
        done.await.unwrap();

        assert_eq!(seen_letters.values(), vec!["a", "b"]);
        assert_eq!(seen_numbers.values(), vec![1, 2]);
    }
}
