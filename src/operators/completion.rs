//! Bridges a push source to a future that resolves on its terminal signal.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::PushError;
use crate::push::{Observer, PushObservable};

/// Future resolving with a source's terminal signal.
pub type Completion = BoxFuture<'static, Result<(), PushError>>;

struct CompletionObserver {
    tx: Mutex<Option<oneshot::Sender<Result<(), PushError>>>>,
}

impl CompletionObserver {
    fn resolve(&self, outcome: Result<(), PushError>) {
        if let Some(tx) = self.tx.lock().take() {
            let _ = tx.send(outcome);
        }
    }
}

impl<T> Observer<T> for CompletionObserver {
    fn on_next(&self, _value: &T) {}

    fn on_completed(&self) {
        self.resolve(Ok(()));
    }

    fn on_error(&self, error: &PushError) {
        self.resolve(Err(error.clone()));
    }
}

/// Returns a future resolving with `Ok(())` when `source` completes or with
/// its fault.
///
/// Subscribes immediately, so values pushed later are not missed by the
/// terminal signal. If the source is dropped without terminating, the future
/// resolves with [`PushError::Abandoned`].
///
/// # Example
/// ```
/// use pushflow::{completion, PushSubject};
///
/// # futures::executor::block_on(async {
/// let subject = PushSubject::<u8>::new();
/// let done = completion(&subject);
/// subject.push_value(1);
/// subject.complete();
/// assert_eq!(done.await, Ok(()));
/// # });
/// ```
pub fn completion<T: 'static>(source: &dyn PushObservable<T>) -> Completion {
    let (tx, rx) = oneshot::channel();
    let observer = Arc::new(CompletionObserver {
        tx: Mutex::new(Some(tx)),
    });
    // The observer stays attached until the terminal signal drains the source.
    let _attached = source.subscribe(observer);
    async move { rx.await.unwrap_or(Err(PushError::Abandoned)) }.boxed()
}
