//! # CombineWithLatest
//!
//! Caches the most recent value of each side and emits
//! `selector(latest_a, latest_b)` whenever either side produces a value,
//! once **both** sides have produced at least one.
//!
//! ```text
//! a:   1 ─────────── 2 ─────────
//! b:   ────── "x" ──────── "y" ─
//! out: ────── (1,x) ─ (2,x) ─ (2,y)
//! ```
//!
//! ## Rules
//! - Completes when **both** sides completed (one side alone may still update the result).
//! - A fault on either side faults the output and detaches both sides.
//! - Every update is combined and pushed before the next update of either side
//!   is applied, so the last emission always matches the cache. The delivery
//!   lock is reentrant: a downstream observer may push back into a side.
//! - The cache lock itself is released before the selector runs.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};

use crate::error::PushError;
use crate::push::{Observer, PushObservable, PushSubject, Subscription};

type Selector<A, B, O> = Box<dyn Fn(&A, &B) -> O + Send + Sync>;

struct Latest<A, B> {
    a: Option<A>,
    b: Option<B>,
    a_done: bool,
    b_done: bool,
}

struct CombineShared<A, B, O> {
    subject: PushSubject<O>,
    delivery: ReentrantMutex<()>,
    latest: Mutex<Latest<A, B>>,
    selector: Selector<A, B, O>,
    upstreams: Mutex<Vec<Subscription>>,
}

impl<A, B, O> CombineShared<A, B, O> {
    fn emit(&self, a: &A, b: &B) {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.selector)(a, b))) {
            Ok(combined) => {
                self.subject.push_value(combined);
            }
            Err(payload) => self.fail(PushError::from_panic(payload.as_ref())),
        }
    }

    fn side_completed(&self, left: bool) {
        let _delivery = self.delivery.lock();
        let both = {
            let mut latest = self.latest.lock();
            if left {
                latest.a_done = true;
            } else {
                latest.b_done = true;
            }
            latest.a_done && latest.b_done
        };
        if both {
            self.subject.complete();
        }
    }

    fn fail(&self, error: PushError) {
        let _delivery = self.delivery.lock();
        if self.subject.fault(error) {
            let upstreams = std::mem::take(&mut *self.upstreams.lock());
            for upstream in &upstreams {
                upstream.unsubscribe();
            }
        }
    }
}

struct LeftObserver<A, B, O> {
    shared: Arc<CombineShared<A, B, O>>,
}

struct RightObserver<A, B, O> {
    shared: Arc<CombineShared<A, B, O>>,
}

impl<A, B, O> Observer<A> for LeftObserver<A, B, O>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    fn on_next(&self, value: &A) {
        let _delivery = self.shared.delivery.lock();
        let other = {
            let mut latest = self.shared.latest.lock();
            latest.a = Some(value.clone());
            latest.b.clone()
        };
        if let Some(b) = other {
            self.shared.emit(value, &b);
        }
    }

    fn on_completed(&self) {
        self.shared.side_completed(true);
    }

    fn on_error(&self, error: &PushError) {
        self.shared.fail(error.clone());
    }
}

impl<A, B, O> Observer<B> for RightObserver<A, B, O>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    fn on_next(&self, value: &B) {
        let _delivery = self.shared.delivery.lock();
        let other = {
            let mut latest = self.shared.latest.lock();
            latest.b = Some(value.clone());
            latest.a.clone()
        };
        if let Some(a) = other {
            self.shared.emit(&a, value);
        }
    }

    fn on_completed(&self) {
        self.shared.side_completed(false);
    }

    fn on_error(&self, error: &PushError) {
        self.shared.fail(error.clone());
    }
}

/// Output of [`combine_with_latest`].
pub struct CombineWithLatest<A, B, O> {
    shared: Arc<CombineShared<A, B, O>>,
}

impl<A, B, O> CombineWithLatest<A, B, O>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    /// Subscribes to `a` then `b`.
    pub fn new(
        a: &dyn PushObservable<A>,
        b: &dyn PushObservable<B>,
        selector: impl Fn(&A, &B) -> O + Send + Sync + 'static,
    ) -> Self {
        let shared = Arc::new(CombineShared {
            subject: PushSubject::new(),
            delivery: ReentrantMutex::new(()),
            latest: Mutex::new(Latest {
                a: None,
                b: None,
                a_done: false,
                b_done: false,
            }),
            selector: Box::new(selector),
            upstreams: Mutex::new(Vec::with_capacity(2)),
        });

        let left = a.subscribe(Arc::new(LeftObserver {
            shared: Arc::clone(&shared),
        }));
        shared.upstreams.lock().push(left);
        if !shared.subject.is_terminated() {
            let right = b.subscribe(Arc::new(RightObserver {
                shared: Arc::clone(&shared),
            }));
            shared.upstreams.lock().push(right);
        }
        if shared.subject.is_terminated() {
            let upstreams = std::mem::take(&mut *shared.upstreams.lock());
            for upstream in &upstreams {
                upstream.unsubscribe();
            }
        }
        Self { shared }
    }
}

impl<A, B, O: 'static> PushObservable<O> for CombineWithLatest<A, B, O>
where
    A: Send + Sync,
    B: Send + Sync,
{
    fn subscribe(&self, observer: Arc<dyn Observer<O>>) -> Subscription {
        self.shared.subject.subscribe(observer)
    }
}

/// Combines the latest values of `a` and `b` through `selector`.
pub fn combine_with_latest<A, B, O>(
    a: &dyn PushObservable<A>,
    b: &dyn PushObservable<B>,
    selector: impl Fn(&A, &B) -> O + Send + Sync + 'static,
) -> CombineWithLatest<A, B, O>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    CombineWithLatest::new(a, b, selector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Recorder;

    fn pair(a: &i32, b: &&'static str) -> (i32, &'static str) {
        (*a, *b)
    }

    #[test]
    fn test_waits_for_both_sides_then_recombines() {
        let a = PushSubject::<i32>::new();
        let b = PushSubject::<&'static str>::new();
        let out = combine_with_latest(&a, &b, pair);
        let rec = Recorder::new();
        out.subscribe(rec.clone());

        a.push_value(1);
        assert!(rec.values().is_empty());
        b.push_value("x");
        a.push_value(2);
        b.push_value("y");

        assert_eq!(rec.values(), vec![(1, "x"), (2, "x"), (2, "y")]);
    }

    #[test]
    fn test_completes_when_both_sides_complete() {
        let a = PushSubject::<i32>::new();
        let b = PushSubject::<&'static str>::new();
        let out = combine_with_latest(&a, &b, pair);
        let rec = Recorder::new();
        out.subscribe(rec.clone());

        a.push_value(1);
        a.complete();
        b.push_value("x");
        assert_eq!(rec.completions(), 0);
        b.push_value("z");
        b.complete();

        assert_eq!(rec.values(), vec![(1, "x"), (1, "z")]);
        assert_eq!(rec.completions(), 1);
    }

    #[test]
    fn test_fault_on_either_side_detaches_both() {
        let a = PushSubject::<i32>::new();
        let b = PushSubject::<&'static str>::new();
        let out = combine_with_latest(&a, &b, pair);
        let rec = Recorder::new();
        out.subscribe(rec.clone());

        b.fault(PushError::fail("b broke"));
        assert_eq!(rec.errors(), vec![PushError::fail("b broke")]);
        assert_eq!(a.observer_count(), 0);
        a.push_value(1);
        assert!(rec.values().is_empty());
    }

    #[test]
    fn test_selector_panic_faults_output() {
        let a = PushSubject::<i32>::new();
        let b = PushSubject::<i32>::new();
        let out = combine_with_latest(&a, &b, |x: &i32, y: &i32| {
            if *y == 0 {
                panic!("division by zero");
            }
            x / y
        });
        let rec = Recorder::new();
        out.subscribe(rec.clone());

        a.push_value(4);
        b.push_value(2);
        b.push_value(0);
        assert_eq!(rec.values(), vec![2]);
        assert_eq!(
            rec.errors(),
            vec![PushError::Panicked {
                info: "division by zero".into()
            }]
        );
    }

    #[test]
    fn test_concurrent_sides_emit_in_cache_order() {
        use std::sync::mpsc;
        use std::thread;
        use std::time::Duration;

        let a = PushSubject::<i32>::new();
        let b = PushSubject::<&'static str>::new();
        let (entered_tx, entered_rx) = mpsc::channel();
        let entered_tx = Mutex::new(entered_tx);
        let out = combine_with_latest(&a, &b, move |n: &i32, s: &&'static str| {
            if (*n, *s) == (2, "x") {
                let _ = entered_tx.lock().send(());
                thread::sleep(Duration::from_millis(100));
            }
            (*n, *s)
        });
        let rec = Recorder::new();
        out.subscribe(rec.clone());

        a.push_value(1);
        b.push_value("x");
        let left = a.clone();
        let pusher = thread::spawn(move || {
            left.push_value(2);
        });
        entered_rx.recv().unwrap();
        b.push_value("y");
        pusher.join().unwrap();

        assert_eq!(rec.values(), vec![(1, "x"), (2, "x"), (2, "y")]);
    }
}
