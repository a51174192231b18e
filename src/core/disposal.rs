//! # Disposal registry
//!
//! [`DisposableRegistry`] holds release actions keyed by a generated
//! [`DisposableKey`] and runs each of them exactly once, when the owning
//! context's aggregate completion resolves (success or fault).
//!
//! ## Rules
//! - Release order is the reverse of registration order (LIFO).
//! - A failing or panicking action never stops the others; failures are
//!   collected into [`DisposeError`]s and surfaced once with the job result.
//! - Registering after the registry was disposed releases the resource at
//!   once (and logs a warning), so nothing is leaked.
//! - Dropping a registry that was never disposed releases what it still holds.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::{panic_info, DisposeError};
use crate::push::Subscription;

/// Boxed error returned by a failing release action.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// A resource whose release the execution context owns.
pub trait Disposable: Send + 'static {
    /// Releases the resource. Called at most once.
    fn dispose(self: Box<Self>) -> Result<(), BoxError>;

    /// Name used in logs and [`DisposeError::resource`].
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Closure-backed [`Disposable`].
///
/// # Example
/// ```
/// use pushflow::{DisposableRegistry, DisposeFn};
///
/// let registry = DisposableRegistry::new();
/// registry.add(DisposeFn::new("temp-dir", || Ok(())));
/// registry.add(DisposeFn::new("socket", || Err("reset by peer".into())));
///
/// let failures = registry.dispose_all();
/// assert_eq!(failures.len(), 1);
/// assert_eq!(failures[0].to_string(), "failed to release socket: reset by peer");
/// ```
pub struct DisposeFn<F> {
    name: Arc<str>,
    release: F,
}

impl<F> DisposeFn<F>
where
    F: FnOnce() -> Result<(), BoxError> + Send + 'static,
{
    /// Creates a named release action.
    pub fn new(name: impl Into<Arc<str>>, release: F) -> Self {
        Self {
            name: name.into(),
            release,
        }
    }
}

impl<F> Disposable for DisposeFn<F>
where
    F: FnOnce() -> Result<(), BoxError> + Send + 'static,
{
    fn dispose(self: Box<Self>) -> Result<(), BoxError> {
        (self.release)()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Disposable for Subscription {
    fn dispose(self: Box<Self>) -> Result<(), BoxError> {
        self.unsubscribe();
        Ok(())
    }

    fn name(&self) -> &str {
        "subscription"
    }
}

impl Disposable for CancellationToken {
    fn dispose(self: Box<Self>) -> Result<(), BoxError> {
        self.cancel();
        Ok(())
    }

    fn name(&self) -> &str {
        "cancellation-token"
    }
}

/// Key of a registered resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DisposableKey(u64);

struct RegistryState {
    next_key: u64,
    entries: BTreeMap<u64, Box<dyn Disposable>>,
    disposed: bool,
}

/// Keyed set of release actions, each run exactly once.
pub struct DisposableRegistry {
    state: Mutex<RegistryState>,
}

impl Default for DisposableRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DisposableRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                next_key: 0,
                entries: BTreeMap::new(),
                disposed: false,
            }),
        }
    }

    /// Registers `resource`; it is released by [`dispose_all`](Self::dispose_all).
    pub fn add(&self, resource: impl Disposable) -> DisposableKey {
        self.add_boxed(Box::new(resource))
    }

    /// Boxed variant of [`add`](Self::add).
    pub fn add_boxed(&self, resource: Box<dyn Disposable>) -> DisposableKey {
        let mut state = self.state.lock();
        let key = state.next_key;
        state.next_key += 1;

        if state.disposed {
            drop(state);
            tracing::warn!(
                resource = resource.name(),
                "resource registered after disposal; releasing immediately"
            );
            if let Err(err) = release(resource) {
                tracing::warn!(error = %err, "late release failed");
            }
        } else {
            state.entries.insert(key, resource);
        }
        DisposableKey(key)
    }

    /// Unregisters a resource without releasing it. Returns it, if still pending.
    pub fn remove(&self, key: DisposableKey) -> Option<Box<dyn Disposable>> {
        self.state.lock().entries.remove(&key.0)
    }

    /// Number of resources waiting for release.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Returns true if nothing waits for release.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true once [`dispose_all`](Self::dispose_all) ran.
    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    /// Releases every registered resource in reverse registration order.
    ///
    /// Returns the failures; an empty vector means everything was released.
    /// Only the first call releases anything.
    pub fn dispose_all(&self) -> Vec<DisposeError> {
        let entries = {
            let mut state = self.state.lock();
            if state.disposed {
                return Vec::new();
            }
            state.disposed = true;
            std::mem::take(&mut state.entries)
        };

        let mut failures = Vec::new();
        for (_, resource) in entries.into_iter().rev() {
            if let Err(err) = release(resource) {
                tracing::warn!(error = %err, "release action failed");
                failures.push(err);
            }
        }
        failures
    }
}

impl Drop for DisposableRegistry {
    fn drop(&mut self) {
        let pending = {
            let state = self.state.get_mut();
            if state.disposed || state.entries.is_empty() {
                return;
            }
            state.entries.len()
        };
        tracing::warn!(pending, "registry dropped before disposal; releasing pending resources");
        let _ = self.dispose_all();
    }
}

impl fmt::Debug for DisposableRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DisposableRegistry")
            .field("pending", &state.entries.len())
            .field("disposed", &state.disposed)
            .finish()
    }
}

fn release(resource: Box<dyn Disposable>) -> Result<(), DisposeError> {
    let name: Arc<str> = resource.name().into();
    match panic::catch_unwind(AssertUnwindSafe(move || resource.dispose())) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(DisposeError {
            resource: name,
            error: err.to_string().into(),
        }),
        Err(payload) => Err(DisposeError {
            resource: name,
            error: format!("panicked: {}", panic_info(payload.as_ref())).into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(name: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> impl Disposable {
        let log = Arc::clone(log);
        DisposeFn::new(name, move || {
            log.lock().push(name);
            Ok(())
        })
    }

    #[test]
    fn test_dispose_runs_lifo_once() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = DisposableRegistry::new();
        registry.add(recording("a", &log));
        registry.add(recording("b", &log));
        registry.add(recording("c", &log));
        assert_eq!(registry.len(), 3);

        assert!(registry.dispose_all().is_empty());
        assert!(registry.dispose_all().is_empty());
        assert_eq!(*log.lock(), vec!["c", "b", "a"]);
        assert!(registry.is_disposed());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_failures_do_not_stop_other_releases() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = DisposableRegistry::new();
        registry.add(recording("first", &log));
        registry.add(DisposeFn::new("broken", || Err("disk full".into())));
        registry.add(DisposeFn::new("panicky", || panic!("release bug")));
        registry.add(recording("last", &log));

        let failures = registry.dispose_all();
        assert_eq!(*log.lock(), vec!["last", "first"]);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].resource.as_ref(), "panicky");
        assert_eq!(failures[0].error.as_ref(), "panicked: release bug");
        assert_eq!(failures[1].resource.as_ref(), "broken");
    }

    #[test]
    fn test_removed_resource_is_not_released() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = DisposableRegistry::new();
        let key = registry.add(recording("kept-alive", &log));
        registry.add(recording("released", &log));

        assert!(registry.remove(key).is_some());
        assert!(registry.remove(key).is_none());
        registry.dispose_all();
        assert_eq!(*log.lock(), vec!["released"]);
    }

    #[test]
    fn test_add_after_disposal_releases_immediately() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = DisposableRegistry::new();
        registry.dispose_all();
        registry.add(recording("late", &log));
        assert_eq!(*log.lock(), vec!["late"]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_drop_releases_pending_resources() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = DisposableRegistry::new();
        registry.add(recording("first", &log));
        registry.add(recording("second", &log));
        drop(registry);
        assert_eq!(*log.lock(), vec!["second", "first"]);

        let disposed = DisposableRegistry::new();
        disposed.dispose_all();
        disposed.add(recording("late", &log));
        drop(disposed);
        assert_eq!(*log.lock(), vec!["second", "first", "late"]);
    }

    #[test]
    fn test_subscription_and_token_are_disposable() {
        let token = CancellationToken::new();
        let registry = DisposableRegistry::new();
        let sub = Subscription::new(|| {});
        registry.add(token.clone());
        registry.add(sub);
        assert!(registry.dispose_all().is_empty());
        assert!(token.is_cancelled());
    }
}
