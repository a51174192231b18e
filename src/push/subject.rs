//! # PushSubject: multicast push source
//!
//! [`PushSubject`] keeps its observers in an indexed registry: every
//! subscription gets a stable, monotonically increasing id, so iteration order
//! is subscription order and removal never shifts other entries.
//!
//! ## Architecture
//! ```text
//! PushSubject (cheap clone, shared Arc)
//!   ├─ delivery: ReentrantMutex<()>      serializes pushes/terminals on this subject only
//!   ├─ terminated: AtomicBool            fast check between deliveries
//!   └─ state: Mutex<State>
//!        ├─ observers: BTreeMap<id, Entry { observer, active }>
//!        └─ terminal: Option<Terminal>
//! ```
//!
//! ## Rules
//! - Each push snapshots the registry (copy-on-iterate) and releases the state
//!   lock before calling observers, so observers may subscribe, unsubscribe or
//!   push again from inside a callback.
//! - An entry's `active` flag is cleared on unsubscribe; a snapshot skips
//!   inactive entries, so an observer removed mid-push gets nothing more.
//! - Terminal signals drain the registry; `active.swap(false)` guarantees each
//!   observer sees at most one terminal signal.
//! - Pushes on the same subject from several threads are serialized; pushes on
//!   different subjects never contend.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex};

use super::{Observer, PushObservable, Subscription};
use crate::error::PushError;

#[derive(Clone)]
enum Terminal {
    Completed,
    Faulted(PushError),
}

struct Entry<T> {
    observer: Arc<dyn Observer<T>>,
    active: Arc<AtomicBool>,
}

struct State<T> {
    next_id: u64,
    observers: BTreeMap<u64, Entry<T>>,
    terminal: Option<Terminal>,
}

struct Inner<T> {
    delivery: ReentrantMutex<()>,
    terminated: AtomicBool,
    state: Mutex<State<T>>,
}

/// Multicast, push-only source of `T`.
///
/// Cloning yields another handle to the **same** subject.
///
/// # Example
/// ```
/// use std::sync::{Arc, Mutex};
/// use pushflow::{FnObserver, PushObservable, PushSubject};
///
/// let subject = PushSubject::<&'static str>::new();
/// let log = Arc::new(Mutex::new(Vec::new()));
/// let sink = log.clone();
/// let done = log.clone();
/// subject.subscribe(
///     FnObserver::new(move |v: &&str| sink.lock().unwrap().push(v.to_string()))
///         .with_completed(move || done.lock().unwrap().push("done".into()))
///         .arc(),
/// );
///
/// assert!(subject.push_value("a"));
/// assert!(subject.complete());
/// assert!(!subject.push_value("b")); // ignored after completion
/// assert_eq!(*log.lock().unwrap(), vec!["a", "done"]);
/// ```
pub struct PushSubject<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for PushSubject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for PushSubject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PushSubject<T> {
    /// Creates a subject with no observers.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                delivery: ReentrantMutex::new(()),
                terminated: AtomicBool::new(false),
                state: Mutex::new(State {
                    next_id: 0,
                    observers: BTreeMap::new(),
                    terminal: None,
                }),
            }),
        }
    }

    /// Delivers `value` to every current observer, in subscription order.
    ///
    /// Returns `false` (and delivers nothing) once the subject is terminated.
    pub fn push_value(&self, value: T) -> bool {
        let _delivery = self.inner.delivery.lock();
        let targets = {
            let state = self.inner.state.lock();
            if state.terminal.is_some() {
                tracing::debug!("push ignored: subject already terminated");
                return false;
            }
            snapshot(&state.observers)
        };

        for (observer, active) in targets {
            if self.inner.terminated.load(Ordering::Acquire) {
                break;
            }
            if active.load(Ordering::Acquire) {
                observer.on_next(&value);
            }
        }
        true
    }

    /// Terminates the subject successfully.
    ///
    /// Returns `false` if a terminal signal was already delivered.
    pub fn complete(&self) -> bool {
        self.terminate(Terminal::Completed)
    }

    /// Terminates the subject with `error`.
    ///
    /// Mutually exclusive with [`complete`](Self::complete): returns `false`
    /// if a terminal signal was already delivered.
    pub fn fault(&self, error: PushError) -> bool {
        self.terminate(Terminal::Faulted(error))
    }

    /// Returns true once `complete` or `fault` succeeded.
    pub fn is_terminated(&self) -> bool {
        self.inner.terminated.load(Ordering::Acquire)
    }

    /// Returns the number of currently attached observers.
    pub fn observer_count(&self) -> usize {
        self.inner.state.lock().observers.len()
    }

    fn terminate(&self, terminal: Terminal) -> bool {
        let _delivery = self.inner.delivery.lock();
        let entries = {
            let mut state = self.inner.state.lock();
            if state.terminal.is_some() {
                tracing::debug!("terminal signal ignored: subject already terminated");
                return false;
            }
            state.terminal = Some(terminal.clone());
            self.inner.terminated.store(true, Ordering::Release);
            std::mem::take(&mut state.observers)
        };

        for entry in entries.into_values() {
            if entry.active.swap(false, Ordering::AcqRel) {
                deliver_terminal(entry.observer.as_ref(), &terminal);
            }
        }
        true
    }
}

impl<T: 'static> PushObservable<T> for PushSubject<T> {
    fn subscribe(&self, observer: Arc<dyn Observer<T>>) -> Subscription {
        let (id, active) = {
            let mut state = self.inner.state.lock();
            if let Some(terminal) = state.terminal.clone() {
                drop(state);
                deliver_terminal(observer.as_ref(), &terminal);
                return Subscription::empty();
            }
            let id = state.next_id;
            state.next_id += 1;
            let active = Arc::new(AtomicBool::new(true));
            state.observers.insert(
                id,
                Entry {
                    observer,
                    active: Arc::clone(&active),
                },
            );
            (id, active)
        };

        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            active.store(false, Ordering::Release);
            if let Some(inner) = weak.upgrade() {
                inner.state.lock().observers.remove(&id);
            }
        })
    }
}

impl<T> fmt::Debug for PushSubject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushSubject")
            .field("observers", &self.observer_count())
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

fn snapshot<T>(observers: &BTreeMap<u64, Entry<T>>) -> Vec<(Arc<dyn Observer<T>>, Arc<AtomicBool>)> {
    observers
        .values()
        .map(|e| (Arc::clone(&e.observer), Arc::clone(&e.active)))
        .collect()
}

fn deliver_terminal<T>(observer: &dyn Observer<T>, terminal: &Terminal) {
    match terminal {
        Terminal::Completed => observer.on_completed(),
        Terminal::Faulted(error) => observer.on_error(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::FnObserver;
    use crate::testing::Recorder;

    #[test]
    fn test_values_reach_observers_in_subscription_order() {
        let subject = PushSubject::<i32>::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let o = order.clone();
            subject.subscribe(FnObserver::new(move |v: &i32| o.lock().push((tag, *v))).arc());
        }

        subject.push_value(7);
        assert_eq!(
            *order.lock(),
            vec![("first", 7), ("second", 7), ("third", 7)]
        );
    }

    #[test]
    fn test_single_terminal_signal() {
        let subject = PushSubject::<i32>::new();
        let rec = Recorder::new();
        subject.subscribe(rec.clone());

        assert!(subject.push_value(1));
        assert!(subject.complete());
        assert!(!subject.complete());
        assert!(!subject.fault(PushError::fail("late")));
        assert!(!subject.push_value(2));

        assert_eq!(rec.values(), vec![1]);
        assert_eq!(rec.completions(), 1);
        assert!(rec.errors().is_empty());
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn test_fault_excludes_completion() {
        let subject = PushSubject::<i32>::new();
        let rec = Recorder::new();
        subject.subscribe(rec.clone());

        assert!(subject.fault(PushError::fail("boom")));
        assert!(!subject.complete());
        assert_eq!(rec.errors(), vec![PushError::fail("boom")]);
        assert_eq!(rec.completions(), 0);
    }

    #[test]
    fn test_late_subscriber_gets_terminal_without_values() {
        let subject = PushSubject::<i32>::new();
        subject.push_value(1);
        subject.complete();

        let rec = Recorder::new();
        let sub = subject.subscribe(rec.clone());
        assert!(sub.is_closed());
        assert!(rec.values().is_empty());
        assert_eq!(rec.completions(), 1);

        let faulted = PushSubject::<i32>::new();
        faulted.fault(PushError::fail("x"));
        let rec = Recorder::new();
        faulted.subscribe(rec.clone());
        assert_eq!(rec.errors(), vec![PushError::fail("x")]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let subject = PushSubject::<i32>::new();
        let rec = Recorder::new();
        let sub = subject.subscribe(rec.clone());

        subject.push_value(1);
        sub.unsubscribe();
        subject.push_value(2);
        subject.complete();

        assert_eq!(rec.values(), vec![1]);
        assert_eq!(rec.completions(), 0);
    }

    #[test]
    fn test_unsubscribe_mid_push_keeps_other_observers() {
        let subject = PushSubject::<i32>::new();
        let second = Recorder::new();
        let third = Recorder::new();

        // First observer detaches the second one while the push is in flight.
        let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let v = victim.clone();
        subject.subscribe(
            FnObserver::new(move |_: &i32| {
                if let Some(sub) = v.lock().as_ref() {
                    sub.unsubscribe();
                }
            })
            .arc(),
        );
        *victim.lock() = Some(subject.subscribe(second.clone()));
        subject.subscribe(third.clone());

        subject.push_value(1);
        subject.push_value(2);

        assert!(second.values().is_empty());
        assert_eq!(third.values(), vec![1, 2]);
    }

    #[test]
    fn test_self_unsubscribe_from_callback() {
        let subject = PushSubject::<i32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handle: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let s = seen.clone();
        let h = handle.clone();
        let sub = subject.subscribe(
            FnObserver::new(move |v: &i32| {
                s.lock().push(*v);
                if let Some(sub) = h.lock().as_ref() {
                    sub.unsubscribe();
                }
            })
            .arc(),
        );
        *handle.lock() = Some(sub);

        subject.push_value(1);
        subject.push_value(2);
        assert_eq!(*seen.lock(), vec![1]);
    }

    #[test]
    fn test_complete_from_callback_stops_current_push() {
        let subject = PushSubject::<i32>::new();
        let trigger = subject.clone();
        subject.subscribe(
            FnObserver::new(move |v: &i32| {
                if *v == 2 {
                    trigger.complete();
                }
            })
            .arc(),
        );
        let rec = Recorder::new();
        subject.subscribe(rec.clone());

        subject.push_value(1);
        subject.push_value(2);

        assert_eq!(rec.values(), vec![1]);
        assert_eq!(rec.completions(), 1);
    }

    #[test]
    fn test_concurrent_pushes_are_all_delivered() {
        let subject = PushSubject::<u32>::new();
        let rec = Recorder::new();
        subject.subscribe(rec.clone());

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let s = subject.clone();
                std::thread::spawn(move || {
                    for i in 0..250 {
                        s.push_value(t * 1000 + i);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut values = rec.values();
        assert_eq!(values.len(), 1000);
        values.sort_unstable();
        values.dedup();
        assert_eq!(values.len(), 1000);
    }
}
