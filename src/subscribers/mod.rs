//! # Trace subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`]
//! fan-out that feeds subscribers from a job's trace stream.
//!
//! ## Architecture
//! ```text
//! Tracer ── trace(content) ──► trace channel ──► SubscriberSet ──► per-subscriber queue
//!                                                                      │
//!                                                                 ┌────┴────┬────────┐
//!                                                                 ▼         ▼        ▼
//!                                                             LogWriter  Metrics  Custom
//! ```
//!
//! Subscribers are registered with
//! [`ExecutionContextBuilder::with_subscribers`](crate::ExecutionContextBuilder::with_subscribers).
//! The context drains every queue before `execute` returns.

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
