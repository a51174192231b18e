//! # Map
//!
//! [`MapSubject`] transforms every value of its input. The mapping may fail:
//! an `Err` (or a panic) faults the output and detaches from the input.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::PushError;
use crate::push::{Observer, PushObservable, PushSubject, Subscription};

type Mapper<T, U> = Box<dyn Fn(&T) -> Result<U, PushError> + Send + Sync>;

struct MapShared<T, U> {
    subject: PushSubject<U>,
    mapper: Mapper<T, U>,
    upstream: Mutex<Option<Subscription>>,
}

impl<T, U> MapShared<T, U> {
    fn fail(&self, error: PushError) {
        if self.subject.fault(error) {
            if let Some(upstream) = self.upstream.lock().take() {
                upstream.unsubscribe();
            }
        }
    }
}

struct MapObserver<T, U> {
    shared: Arc<MapShared<T, U>>,
}

impl<T, U> Observer<T> for MapObserver<T, U>
where
    T: Send + Sync + 'static,
    U: Send + Sync + 'static,
{
    fn on_next(&self, value: &T) {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.shared.mapper)(value))) {
            Ok(Ok(mapped)) => {
                self.shared.subject.push_value(mapped);
            }
            Ok(Err(error)) => self.shared.fail(error),
            Err(payload) => self.shared.fail(PushError::from_panic(payload.as_ref())),
        }
    }

    fn on_completed(&self) {
        self.shared.subject.complete();
    }

    fn on_error(&self, error: &PushError) {
        self.shared.subject.fault(error.clone());
    }
}

/// Output of [`map`] and [`try_map`].
pub struct MapSubject<T, U> {
    shared: Arc<MapShared<T, U>>,
}

impl<T, U> MapSubject<T, U>
where
    T: Send + Sync + 'static,
    U: Send + Sync + 'static,
{
    /// Subscribes to `source` and maps it through `mapper`.
    pub fn new(
        source: &dyn PushObservable<T>,
        mapper: impl Fn(&T) -> Result<U, PushError> + Send + Sync + 'static,
    ) -> Self {
        let shared = Arc::new(MapShared {
            subject: PushSubject::new(),
            mapper: Box::new(mapper),
            upstream: Mutex::new(None),
        });
        let upstream = source.subscribe(Arc::new(MapObserver {
            shared: Arc::clone(&shared),
        }));
        if shared.subject.is_terminated() {
            upstream.unsubscribe();
        } else {
            *shared.upstream.lock() = Some(upstream);
        }
        Self { shared }
    }
}

impl<T, U: 'static> PushObservable<U> for MapSubject<T, U>
where
    T: Send + Sync,
{
    fn subscribe(&self, observer: Arc<dyn Observer<U>>) -> Subscription {
        self.shared.subject.subscribe(observer)
    }
}

/// Transforms every value of `source` with an infallible `f`.
pub fn map<T, U>(
    source: &dyn PushObservable<T>,
    f: impl Fn(&T) -> U + Send + Sync + 'static,
) -> MapSubject<T, U>
where
    T: Send + Sync + 'static,
    U: Send + Sync + 'static,
{
    MapSubject::new(source, move |value| Ok(f(value)))
}

/// Transforms every value of `source`; the first `Err` faults the output.
pub fn try_map<T, U>(
    source: &dyn PushObservable<T>,
    f: impl Fn(&T) -> Result<U, PushError> + Send + Sync + 'static,
) -> MapSubject<T, U>
where
    T: Send + Sync + 'static,
    U: Send + Sync + 'static,
{
    MapSubject::new(source, f)
}
