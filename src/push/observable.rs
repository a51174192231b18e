use std::sync::Arc;

use super::{Observer, Subscription};

/// # Anything observers can subscribe to.
///
/// Subjects, operators and deferred generators all implement this trait, so
/// operators compose over `&dyn PushObservable<T>` regardless of what sits
/// upstream.
pub trait PushObservable<T>: Send + Sync {
    /// Attaches `observer` and returns the handle that detaches it.
    ///
    /// Subscribing to an already terminated source delivers the terminal
    /// signal immediately and returns an empty handle.
    fn subscribe(&self, observer: Arc<dyn Observer<T>>) -> Subscription;

    /// Stops the source from starting on its first subscription and returns
    /// the action that starts it instead.
    ///
    /// Only sources that produce on their own (generators) return `Some`;
    /// execution contexts call this when a source is wrapped in a stream, so
    /// that nothing is produced before the job runs.
    fn hold_start(&self) -> Option<Starter> {
        None
    }
}

/// Deferred start action returned by [`PushObservable::hold_start`].
pub type Starter = Box<dyn FnOnce() + Send>;

/// Shared handle to a push source.
pub type ObservableRef<T> = Arc<dyn PushObservable<T>>;
