//! # pushflow
//!
//! **Pushflow** is a push-based reactive execution core for ETL pipelines.
//!
//! Sources push values synchronously to their observers; operators derive new
//! sources from existing ones; an [`ExecutionContext`] ties the streams of one
//! job together, waits for all of them to terminate, releases registered
//! resources exactly once and then drains the job's trace channel.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                 configure(config)
//!                        │
//! ┌──────────────────────▼────────────────────────────────────────────┐
//! │  ExecutionContext<C>                                              │
//! │  - startup channel (one value, then completes)                    │
//! │  - start gate (released by execute)                               │
//! │  - main scope:  CompletionTracker + DisposableRegistry + Tracer   │
//! │  - trace scope: CompletionTracker for the trace stream            │
//! └──────┬──────────────────────────────────────────────┬─────────────┘
//!        ▼                                              │
//!   Startup stream ──► map ──► filter ──► merge ──┐     │
//!   gated range ────────────────────────────────┘ │     │
//!        │ every Stream registers its completion  │     │
//!        │ and traces its row count / fault       ▼     ▼
//!        └──────────────────────────────► trace channel (PushSubject<TraceEvent>)
//!                                                 │
//!                                          SubscriberSet (per-subscriber queues)
//!                                          ┌──────┼──────┐
//!                                          ▼      ▼      ▼
//!                                       worker1 worker2 workerN
//! ```
//!
//! ### Lifecycle
//! ```text
//! execute()
//!   ├─► push config into startup channel, complete it
//!   ├─► release start gate, start generators wrapped in streams
//!   ├─► await every registered stream (first fault aborts the wait)
//!   ├─► dispose registered resources (LIFO, each once, even after a fault)
//!   ├─► complete trace channel, drain subscribers
//!   └─► Ok(()) or RuntimeError
//!
//! dropped or unwound early ─► resources still released, trace channel completed
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                               |
//! |-------------------|--------------------------------------------------------------|--------------------------------------------------|
//! | **Push sources**  | Multicast subjects, observers, unsubscribe handles            | [`PushSubject`], [`Observer`], [`Subscription`]  |
//! | **Generators**    | Deferred finite sources, optionally held by a start gate     | [`DeferredPushObservable`], [`StartGate`]        |
//! | **Operators**     | Filter, distinct, merge, combine-latest, map, first          | [`operators`]                                    |
//! | **Streams**       | Named, traced, self-registering pipeline stages              | [`Stream`], [`Tracer`], [`NodeInfo`]             |
//! | **Execution**     | Completion and disposal protocol of one job                  | [`ExecutionContext`], [`DisposableRegistry`]     |
//! | **Subscriber API**| Hook into the trace channel                                  | [`Subscribe`]                                    |
//! | **Errors**        | Typed faults and job errors                                  | [`PushError`], [`RuntimeError`]                  |
//! | **Configuration** | Context settings                                             | [`ContextConfig`]                                |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use pushflow::{operators, ExecutionContext, FnObserver, PushObservable};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), pushflow::RuntimeError> {
//!     let ctx = ExecutionContext::<i64>::new("sum-job");
//!
//!     // A gated source: it starts pushing when the job executes.
//!     let numbers = ctx.stream("numbers", "Range", operators::range(1, 5, Some(ctx.start_gate())));
//!     let limit = ctx.startup_stream();
//!     let capped = numbers.combine_with_latest("capped", limit, |n, max| (*n).min(*max));
//!
//!     let total = Arc::new(Mutex::new(0));
//!     let sink = total.clone();
//!     capped.subscribe(FnObserver::new(move |v: &i64| *sink.lock().unwrap() += *v).arc());
//!
//!     ctx.configure(3)?;
//!     ctx.execute().await?;
//!     assert_eq!(*total.lock().unwrap(), 1 + 2 + 3 + 3 + 3);
//!     Ok(())
//! }
//! ```
mod core;
mod error;
pub mod operators;
mod push;
mod stream;
mod subscribers;
mod trace;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use crate::core::{
    BoxError, CompletionTracker, ContextConfig, ContextState, Disposable, DisposableKey,
    DisposableRegistry, DisposeFn, ExecutionContext, ExecutionContextBuilder,
};
pub use error::{DisposeError, PushError, RuntimeError};
pub use operators::{completion, Completion};
pub use push::{
    DeferredPushObservable, FnObserver, Generator, ObservableRef, Observer, PushObservable,
    PushSubject, StartGate, Starter, Subscription,
};
pub use stream::Stream;
pub use subscribers::{Subscribe, SubscriberSet};
pub use trace::{NodeContext, NodeInfo, TraceContent, TraceEvent, TraceLevel, Tracer};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
