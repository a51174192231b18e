//! # Trace attribution and trace events.
//!
//! Every traced stream owns a [`Tracer`] bound to a [`NodeInfo`]: the ordered
//! name path from the job root to the stage plus a type label. Tracers turn
//! [`TraceContent`] into [`TraceEvent`]s and push them onto the context-wide
//! trace channel.
//!
//! ## Architecture
//! ```text
//! Stream ──► Tracer { node: job/Startup/parse (Map) }
//!               │ trace(content)
//!               ▼
//!         main scope ── level >= min_trace_level ? ──► trace channel (PushSubject<TraceEvent>)
//!                                                          │
//!                                                          ├──► SubscriberSet workers
//!                                                          └──► trace_stream() observers
//! ```
//!
//! The context's own trace stream has no tracer, so tracing never recurses.

mod event;
mod node;
mod tracer;

pub use event::{TraceContent, TraceEvent, TraceLevel};
pub use node::{NodeContext, NodeInfo};
pub use tracer::Tracer;
