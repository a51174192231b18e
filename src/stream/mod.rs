//! # Streams: the pipeline authoring surface.
//!
//! A [`Stream<T>`] pairs a push source with its position in the pipeline graph
//! ([`NodeInfo`](crate::NodeInfo)), an optional [`Tracer`](crate::Tracer) and
//! the execution scope that owns it.
//!
//! ## Rules
//! - Building a stream registers its completion with the owning context, so
//!   the job does not finish before the stream terminates.
//! - Every stage appends its name to the parent's node path.
//! - A traced stream reports a row count when it completes (if enabled in
//!   [`ContextConfig`](crate::ContextConfig)) and a fault event when it faults.
//! - Cloning a stream yields a pass-through view of the **same** source; it
//!   registers nothing new.
//!
//! ## Example
//! ```rust
//! use pushflow::{ExecutionContext, FnObserver, PushObservable};
//! use std::sync::{Arc, Mutex};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let ctx = ExecutionContext::<u32>::new("doubler");
//! let doubled = ctx.startup_stream().map("double", |n| n * 2);
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//! doubled.subscribe(FnObserver::new(move |v: &u32| sink.lock().unwrap().push(*v)).arc());
//!
//! ctx.configure(21).unwrap();
//! ctx.execute().await.unwrap();
//! assert_eq!(*seen.lock().unwrap(), vec![42]);
//! # }
//! ```

mod handle;
mod probe;
mod stages;

pub use handle::Stream;
