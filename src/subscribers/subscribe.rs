//! # Trace subscriber trait
//!
//! `Subscribe` is the extension point for plugging custom trace handlers into a
//! job. Each subscriber is driven by a dedicated worker task fed by its own
//! queue, owned by the [`SubscriberSet`](crate::subscribers::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching); they do **not** block the
//!   pipeline nor other subscribers.
//! - A subscriber may **declare** its preferred queue capacity via
//!   [`Subscribe::queue_capacity`]. With a bounded queue, events that overflow
//!   it are **dropped** for that subscriber (warn).
//!
//! ## Example
//! ```rust
//! use pushflow::{Subscribe, TraceEvent, TraceLevel};
//!
//! struct ErrorsOnly;
//!
//! #[async_trait::async_trait]
//! impl Subscribe for ErrorsOnly {
//!     async fn on_event(&self, event: &TraceEvent) {
//!         if event.level() >= TraceLevel::Error {
//!             eprintln!("{}: {}", event.node, event.content);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "errors-only" }
//!     fn queue_capacity(&self) -> Option<usize> { Some(256) }
//! }
//! ```

use async_trait::async_trait;

use crate::trace::TraceEvent;

/// Contract for trace subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should avoid
/// blocking the async runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single trace event.
    async fn on_event(&self, event: &TraceEvent);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    ///
    /// `None` uses [`ContextConfig::subscriber_queue_capacity`](crate::ContextConfig::subscriber_queue_capacity);
    /// `Some(0)` means unbounded.
    fn queue_capacity(&self) -> Option<usize> {
        None
    }
}
