//! # Execution context configuration.
//!
//! Provides [`ContextConfig`], the settings of one job's execution context.
//! The job's own configuration value (`C` in
//! [`ExecutionContext<C>`](crate::ExecutionContext)) is not part of it: that
//! value travels through the startup stream.
//!
//! ## Sentinel values
//! - `subscriber_queue_capacity = 0` → unbounded subscriber queues (lossless)

use crate::trace::TraceLevel;

/// Settings for an [`ExecutionContext`](crate::ExecutionContext).
///
/// ## Field semantics
/// - `min_trace_level`: events below this level never reach the trace channel
/// - `count_rows`: every traced stream reports a row count when it completes
/// - `subscriber_queue_capacity`: default queue size for trace subscribers (`0` = unbounded)
///
/// ## Notes
/// All fields are public. Prefer the helper accessors over checking the `0`
/// sentinel by hand.
#[derive(Clone, Debug)]
pub struct ContextConfig {
    /// Minimum level an event needs to be pushed onto the trace channel.
    pub min_trace_level: TraceLevel,

    /// Whether traced streams emit a [`TraceContent::Counter`](crate::TraceContent::Counter)
    /// summary on completion.
    pub count_rows: bool,

    /// Default capacity of each trace subscriber's queue.
    ///
    /// - `0` = unbounded (no event is ever dropped)
    /// - `n > 0` = at most `n` queued events; on overflow the event is dropped
    ///   for that subscriber only
    ///
    /// A subscriber may override it via
    /// [`Subscribe::queue_capacity`](crate::Subscribe::queue_capacity).
    pub subscriber_queue_capacity: usize,
}

impl ContextConfig {
    /// Returns the default subscriber queue capacity as an `Option`.
    ///
    /// - `None` → unbounded
    /// - `Some(n)` → bounded queue of `n` events
    #[inline]
    pub fn queue_capacity(&self) -> Option<usize> {
        if self.subscriber_queue_capacity == 0 {
            None
        } else {
            Some(self.subscriber_queue_capacity)
        }
    }

    /// Returns true if events of `level` pass the trace filter.
    #[inline]
    pub fn traces(&self, level: TraceLevel) -> bool {
        level >= self.min_trace_level
    }
}

impl Default for ContextConfig {
    /// Default configuration:
    ///
    /// - `min_trace_level = Verbose` (everything is traced)
    /// - `count_rows = true`
    /// - `subscriber_queue_capacity = 0` (unbounded)
    fn default() -> Self {
        Self {
            min_trace_level: TraceLevel::Verbose,
            count_rows: true,
            subscriber_queue_capacity: 0,
        }
    }
}
