//! # Distinct
//!
//! [`DistinctFilter`] remembers every value it let through and rejects any
//! later value equal to one of them under the supplied comparer.
//!
//! ## Known limitation
//! The record of accepted values is append-only and unbounded: memory grows
//! with the number of distinct values seen over the source's lifetime.

use parking_lot::Mutex;

use super::filter::{AcceptValue, FilterSubject};
use crate::push::PushObservable;

/// [`AcceptValue`] keeping the first occurrence of each value.
pub struct DistinctFilter<T, C> {
    comparer: C,
    passed: Mutex<Vec<T>>,
}

impl<T, C> DistinctFilter<T, C> {
    /// Creates a filter using `comparer` as equality.
    pub fn new(comparer: C) -> Self {
        Self {
            comparer,
            passed: Mutex::new(Vec::new()),
        }
    }
}

impl<T, C> AcceptValue<T> for DistinctFilter<T, C>
where
    T: Clone + Send + Sync + 'static,
    C: Fn(&T, &T) -> bool + Send + Sync + 'static,
{
    fn accepts(&self, value: &T) -> bool {
        // check-then-add under one lock: two equal concurrent values cannot both pass
        let mut passed = self.passed.lock();
        if passed.iter().any(|p| (self.comparer)(p, value)) {
            return false;
        }
        passed.push(value.clone());
        true
    }
}

/// Suppresses values equal (under `comparer`) to an earlier accepted value.
pub fn distinct_by<T, C>(source: &dyn PushObservable<T>, comparer: C) -> FilterSubject<T>
where
    T: Clone + Send + Sync + 'static,
    C: Fn(&T, &T) -> bool + Send + Sync + 'static,
{
    FilterSubject::new(source, DistinctFilter::new(comparer))
}

/// [`distinct_by`] using the natural equality of `T`.
///
/// # Example
/// ```
/// use std::sync::{Arc, Mutex};
/// use pushflow::{operators, FnObserver, PushObservable, PushSubject};
///
/// let source = PushSubject::<i32>::new();
/// let unique = operators::distinct(&source);
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// unique.subscribe(FnObserver::new(move |v: &i32| sink.lock().unwrap().push(*v)).arc());
///
/// for v in [1, 2, 2, 3, 1] {
///     source.push_value(v);
/// }
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
/// ```
pub fn distinct<T>(source: &dyn PushObservable<T>) -> FilterSubject<T>
where
    T: PartialEq + Clone + Send + Sync + 'static,
{
    distinct_by(source, |l: &T, r: &T| l == r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::PushSubject;
    use crate::testing::Recorder;
    use std::sync::Arc;

    #[test]
    fn test_keeps_first_occurrences_in_order() {
        let source = PushSubject::<i32>::new();
        let out = distinct(&source);
        let rec = Recorder::new();
        out.subscribe(rec.clone());

        for v in [1, 2, 2, 3, 1] {
            source.push_value(v);
        }
        source.complete();

        assert_eq!(rec.values(), vec![1, 2, 3]);
        assert_eq!(rec.completions(), 1);
    }

    #[test]
    fn test_custom_comparer() {
        let source = PushSubject::<String>::new();
        let out = distinct_by(&source, |l: &String, r: &String| {
            l.eq_ignore_ascii_case(r)
        });
        let rec = Recorder::new();
        out.subscribe(rec.clone());

        for v in ["Paris", "paris", "Lyon", "PARIS", "lyon", "Nice"] {
            source.push_value(v.to_string());
        }
        assert_eq!(rec.values(), vec!["Paris", "Lyon", "Nice"]);
    }

    #[test]
    fn test_concurrent_equal_values_pass_once() {
        let source = PushSubject::<u32>::new();
        let out = distinct(&source);
        let rec = Recorder::new();
        out.subscribe(rec.clone());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = source.clone();
                std::thread::spawn(move || {
                    for v in 0..50 {
                        s.push_value(v);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut values = rec.values();
        values.sort_unstable();
        assert_eq!(values, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_filter_is_usable_directly() {
        let filter = Arc::new(DistinctFilter::<i32, _>::new(|l: &i32, r: &i32| l == r));
        assert!(filter.accepts(&1));
        assert!(!filter.accepts(&1));
        assert!(filter.accepts(&2));
    }
}
