//! # Trace events pushed onto the trace channel.
//!
//! A [`TraceEvent`] carries who emitted it ([`NodeInfo`]), what happened
//! ([`TraceContent`]) and when.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the emission order when subscribers
//! process events concurrently.
//!
//! ## Example
//! ```rust
//! use pushflow::{NodeInfo, TraceContent, TraceEvent, TraceLevel};
//!
//! let ev = TraceEvent::new(
//!     uuid::Uuid::nil(),
//!     "nightly",
//!     NodeInfo::root("nightly", "Startup"),
//!     TraceContent::Counter { count: 3 },
//! );
//! assert_eq!(ev.level(), TraceLevel::Info);
//! assert_eq!(ev.content.to_string(), "count=3");
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use uuid::Uuid;

use super::NodeInfo;
use crate::error::PushError;

/// Global sequence counter for event ordering.
static TRACE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Severity of a trace event. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum TraceLevel {
    /// Fine-grained diagnostics.
    #[default]
    Verbose,
    /// Normal progress (row counts, disposal summary).
    Info,
    /// Something went wrong but the job carries on.
    Warning,
    /// A stream faulted or the job contract was violated.
    Error,
}

impl TraceLevel {
    /// Lowercase label used in log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            TraceLevel::Verbose => "verbose",
            TraceLevel::Info => "info",
            TraceLevel::Warning => "warning",
            TraceLevel::Error => "error",
        }
    }
}

/// Payload of a trace event.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceContent {
    /// Free-form message.
    Message {
        /// Severity chosen by the emitter.
        level: TraceLevel,
        /// Message text.
        text: Arc<str>,
    },
    /// Number of values a stream pushed before completing.
    Counter {
        /// Row count.
        count: u64,
    },
    /// A stream terminated with a fault.
    Faulted {
        /// The fault.
        error: PushError,
    },
    /// The disposal registry ran.
    Disposed {
        /// Release actions that succeeded.
        released: usize,
        /// Release actions that failed.
        failed: usize,
    },
}

impl TraceContent {
    /// Message at [`TraceLevel::Verbose`].
    pub fn verbose(text: impl Into<Arc<str>>) -> Self {
        Self::message(TraceLevel::Verbose, text)
    }

    /// Message at [`TraceLevel::Info`].
    pub fn info(text: impl Into<Arc<str>>) -> Self {
        Self::message(TraceLevel::Info, text)
    }

    /// Message at [`TraceLevel::Warning`].
    pub fn warning(text: impl Into<Arc<str>>) -> Self {
        Self::message(TraceLevel::Warning, text)
    }

    /// Message at [`TraceLevel::Error`].
    pub fn error(text: impl Into<Arc<str>>) -> Self {
        Self::message(TraceLevel::Error, text)
    }

    fn message(level: TraceLevel, text: impl Into<Arc<str>>) -> Self {
        TraceContent::Message {
            level,
            text: text.into(),
        }
    }

    /// Severity of this payload.
    pub fn level(&self) -> TraceLevel {
        match self {
            TraceContent::Message { level, .. } => *level,
            TraceContent::Counter { .. } => TraceLevel::Info,
            TraceContent::Faulted { .. } => TraceLevel::Error,
            TraceContent::Disposed { failed, .. } if *failed > 0 => TraceLevel::Warning,
            TraceContent::Disposed { .. } => TraceLevel::Info,
        }
    }
}

impl fmt::Display for TraceContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceContent::Message { text, .. } => f.write_str(text),
            TraceContent::Counter { count } => write!(f, "count={count}"),
            TraceContent::Faulted { error } => write!(f, "faulted: {error}"),
            TraceContent::Disposed { released, failed } => {
                write!(f, "disposed released={released} failed={failed}")
            }
        }
    }
}

/// A single trace record.
#[derive(Debug, Clone)]
pub struct TraceEvent {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Execution that produced the event.
    pub execution_id: Uuid,
    /// Job name.
    pub job_name: Arc<str>,
    /// Emitting node.
    pub node: NodeInfo,
    /// Payload.
    pub content: TraceContent,
}

impl TraceEvent {
    /// Creates an event with the current timestamp and next sequence number.
    pub fn new(
        execution_id: Uuid,
        job_name: impl Into<Arc<str>>,
        node: NodeInfo,
        content: TraceContent,
    ) -> Self {
        Self {
            seq: TRACE_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            execution_id,
            job_name: job_name.into(),
            node,
            content,
        }
    }

    /// Severity of the payload.
    #[inline]
    pub fn level(&self) -> TraceLevel {
        self.content.level()
    }

    /// Returns true if the event reports a stream fault.
    #[inline]
    pub fn is_fault(&self) -> bool {
        matches!(self.content, TraceContent::Faulted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(content: TraceContent) -> TraceEvent {
        TraceEvent::new(Uuid::nil(), "job", NodeInfo::root("job", "Startup"), content)
    }

    #[test]
    fn test_sequence_increases() {
        let a = event(TraceContent::info("a"));
        let b = event(TraceContent::info("b"));
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_levels() {
        assert!(TraceLevel::Verbose < TraceLevel::Error);
        assert_eq!(TraceContent::warning("w").level(), TraceLevel::Warning);
        assert_eq!(
            TraceContent::Faulted {
                error: PushError::fail("x")
            }
            .level(),
            TraceLevel::Error
        );
        assert_eq!(
            TraceContent::Disposed {
                released: 2,
                failed: 1
            }
            .level(),
            TraceLevel::Warning
        );
        assert!(event(TraceContent::Faulted {
            error: PushError::NoRuntime
        })
        .is_fault());
    }
}
