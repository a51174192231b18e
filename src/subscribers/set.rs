//! # Non-blocking trace fan-out to multiple subscribers.
//!
//! [`SubscriberSet`] observes the trace stream and hands every event to each
//! subscriber's queue without blocking the pipeline thread that pushed it.
//!
//! ## Architecture
//! ```text
//! trace stream ── on_next(event) ──► SubscriberSet
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │                     └──────► panic → warn!, keep going
//!     ├──► [queue 2] ──► worker 2 ──► subscriber2.on_event()
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//!
//! trace stream terminates ──► senders dropped ──► workers drain and exit
//! ```
//!
//! ## Rules
//! - **Per-subscriber FIFO**: each subscriber sees events in push order.
//! - **No cross-subscriber ordering**: subscriber A may process event N while B processes N+5.
//! - **Lossless by default**: queues are unbounded unless a capacity is set;
//!   a bounded queue drops on overflow, for that subscriber only.
//! - **Isolation**: a slow or panicking subscriber does not affect others.
//! - **Lazy workers**: queues exist from construction and buffer events;
//!   workers are spawned by [`start`](SubscriberSet::start), from inside a
//!   tokio runtime.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state
//! inconsistent if a subscriber panics while holding a lock.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::Subscribe;
use crate::error::{panic_info, PushError};
use crate::push::Observer;
use crate::trace::TraceEvent;

enum EventSender {
    Bounded(mpsc::Sender<Arc<TraceEvent>>),
    Unbounded(mpsc::UnboundedSender<Arc<TraceEvent>>),
}

enum EventReceiver {
    Bounded(mpsc::Receiver<Arc<TraceEvent>>),
    Unbounded(mpsc::UnboundedReceiver<Arc<TraceEvent>>),
}

impl EventReceiver {
    async fn recv(&mut self) -> Option<Arc<TraceEvent>> {
        match self {
            EventReceiver::Bounded(rx) => rx.recv().await,
            EventReceiver::Unbounded(rx) => rx.recv().await,
        }
    }
}

/// Per-subscriber channel metadata.
struct SubscriberChannel {
    name: &'static str,
    sender: EventSender,
}

/// Fan-out coordinator for trace subscribers.
pub struct SubscriberSet {
    count: usize,
    channels: Mutex<Vec<SubscriberChannel>>,
    idle: Mutex<Vec<(Arc<dyn Subscribe>, EventReceiver)>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl SubscriberSet {
    /// Creates one queue per subscriber.
    ///
    /// `default_capacity` applies to subscribers that do not declare one
    /// (`None` = unbounded).
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, default_capacity: Option<usize>) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut idle = Vec::with_capacity(subs.len());

        for sub in subs {
            let capacity = match sub.queue_capacity() {
                Some(0) => None,
                Some(n) => Some(n),
                None => default_capacity,
            };
            let (sender, receiver) = match capacity {
                Some(cap) => {
                    let (tx, rx) = mpsc::channel(cap);
                    (EventSender::Bounded(tx), EventReceiver::Bounded(rx))
                }
                None => {
                    let (tx, rx) = mpsc::unbounded_channel();
                    (EventSender::Unbounded(tx), EventReceiver::Unbounded(rx))
                }
            };
            channels.push(SubscriberChannel {
                name: sub.name(),
                sender,
            });
            idle.push((sub, receiver));
        }

        Self {
            count: channels.len(),
            channels: Mutex::new(channels),
            idle: Mutex::new(idle),
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the set has no subscriber.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawns one worker per subscriber. Idempotent.
    ///
    /// Outside a tokio runtime nothing is spawned and events keep buffering.
    pub fn start(&self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("trace subscribers not started: no tokio runtime");
            return;
        };
        let idle = std::mem::take(&mut *self.idle.lock());
        let mut workers = self.workers.lock();

        for (sub, mut rx) in idle {
            workers.push(handle.spawn(async move {
                while let Some(event) = rx.recv().await {
                    let fut = sub.on_event(event.as_ref());
                    if let Err(payload) = AssertUnwindSafe(fut).catch_unwind().await {
                        tracing::warn!(
                            subscriber = sub.name(),
                            info = %panic_info(payload.as_ref()),
                            "trace subscriber panicked"
                        );
                    }
                }
            }));
        }
    }

    /// Queues `event` for every subscriber; never blocks.
    pub fn emit(&self, event: Arc<TraceEvent>) {
        for channel in self.channels.lock().iter() {
            let delivered = match &channel.sender {
                EventSender::Bounded(tx) => match tx.try_send(Arc::clone(&event)) {
                    Ok(()) => Ok(()),
                    Err(mpsc::error::TrySendError::Full(_)) => Err("full"),
                    Err(mpsc::error::TrySendError::Closed(_)) => Err("closed"),
                },
                EventSender::Unbounded(tx) => {
                    tx.send(Arc::clone(&event)).map_err(|_| "closed")
                }
            };
            if let Err(reason) = delivered {
                tracing::warn!(
                    subscriber = channel.name,
                    reason,
                    seq = event.seq,
                    "trace event dropped"
                );
            }
        }
    }

    /// Closes every queue; workers exit once they drained what is queued.
    pub fn close(&self) {
        self.channels.lock().clear();
    }

    /// Closes the queues and waits for every worker to finish.
    pub async fn shutdown(&self) {
        self.close();
        self.idle.lock().clear();
        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            let _ = worker.await;
        }
    }
}

impl Observer<TraceEvent> for SubscriberSet {
    fn on_next(&self, value: &TraceEvent) {
        self.emit(Arc::new(value.clone()));
    }

    fn on_completed(&self) {
        self.close();
    }

    fn on_error(&self, error: &PushError) {
        tracing::warn!(error = %error, "trace stream faulted");
        self.close();
    }
}
