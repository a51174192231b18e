//! Built-in stages on [`Stream`].

use super::Stream;
use crate::error::PushError;
use crate::operators;
use crate::push::PushObservable;

impl<T: Clone + Send + Sync + 'static> Stream<T> {
    /// Transforms every value.
    pub fn map<U>(&self, name: &str, f: impl Fn(&T) -> U + Send + Sync + 'static) -> Stream<U>
    where
        U: Send + Sync + 'static,
    {
        self.derive(name, "Map", operators::map(self.source().as_ref(), f))
    }

    /// Transforms every value; the first `Err` faults the derived stream.
    pub fn try_map<U>(
        &self,
        name: &str,
        f: impl Fn(&T) -> Result<U, PushError> + Send + Sync + 'static,
    ) -> Stream<U>
    where
        U: Send + Sync + 'static,
    {
        self.derive(name, "Map", operators::try_map(self.source().as_ref(), f))
    }

    /// Keeps the values matching `predicate`.
    pub fn filter(
        &self,
        name: &str,
        predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Stream<T> {
        self.derive(name, "Filter", operators::filter(self.source().as_ref(), predicate))
    }

    /// Drops values equal to an earlier one.
    pub fn distinct(&self, name: &str) -> Stream<T>
    where
        T: PartialEq,
    {
        self.derive(name, "Distinct", operators::distinct(self.source().as_ref()))
    }

    /// Drops values equal to an earlier one under `comparer`.
    pub fn distinct_by(
        &self,
        name: &str,
        comparer: impl Fn(&T, &T) -> bool + Send + Sync + 'static,
    ) -> Stream<T> {
        self.derive(
            name,
            "Distinct",
            operators::distinct_by(self.source().as_ref(), comparer),
        )
    }

    /// Merges this stream with `others`; completes once all of them completed.
    pub fn merge(&self, name: &str, others: &[&Stream<T>]) -> Stream<T> {
        let mut sources: Vec<&dyn PushObservable<T>> = Vec::with_capacity(others.len() + 1);
        sources.push(self.source().as_ref());
        sources.extend(others.iter().map(|s| s.source().as_ref()));
        self.derive(name, "Merge", operators::merge(&sources))
    }

    /// Combines the latest values of this stream and `other` through `selector`.
    pub fn combine_with_latest<B, O>(
        &self,
        name: &str,
        other: &Stream<B>,
        selector: impl Fn(&T, &B) -> O + Send + Sync + 'static,
    ) -> Stream<O>
    where
        B: Clone + Send + Sync + 'static,
        O: Send + Sync + 'static,
    {
        self.derive(
            name,
            "CombineWithLatest",
            operators::combine_with_latest(
                self.source().as_ref(),
                other.source().as_ref(),
                selector,
            ),
        )
    }

    /// Keeps only the first value.
    pub fn first(&self, name: &str) -> Stream<T> {
        self.derive(name, "First", operators::first(self.source().as_ref()))
    }
}
