//! Error types used by push sources, stages and the execution context.
//!
//! This module defines three error types:
//!
//! - [`PushError`]: terminal fault carried through push sources and streams.
//! - [`DisposeError`]: a registered resource-release action that failed.
//! - [`RuntimeError`]: job-level errors returned by
//!   [`ExecutionContext::execute`](crate::ExecutionContext::execute).
//!
//! The enums provide helper methods (`as_label`, `as_message`) for logging.

use std::any::Any;
use std::sync::Arc;

use thiserror::Error;

/// # Terminal fault of a push source.
///
/// A fault is delivered to every observer of a source, so it is cheap to clone
/// (messages are stored as `Arc<str>`).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PushError {
    /// A stage failed while processing a value.
    #[error("stage failed: {error}")]
    Fail {
        /// The underlying error message.
        error: Arc<str>,
    },

    /// A generator or stage callback panicked.
    #[error("callback panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: Arc<str>,
    },

    /// The job could not start (missing or conflicting configuration).
    #[error("startup failed: {reason}")]
    Startup {
        /// Why the startup channel was faulted.
        reason: Arc<str>,
    },

    /// A gated generator was started outside of a tokio runtime.
    #[error("no tokio runtime available to run a gated generator")]
    NoRuntime,

    /// The source was dropped without ever reaching a terminal state.
    #[error("source dropped before reaching a terminal state")]
    Abandoned,
}

impl PushError {
    /// Shorthand for [`PushError::Fail`].
    ///
    /// # Example
    /// ```
    /// use pushflow::PushError;
    ///
    /// let err = PushError::fail("bad row");
    /// assert_eq!(err.to_string(), "stage failed: bad row");
    /// ```
    pub fn fail(error: impl Into<Arc<str>>) -> Self {
        PushError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            PushError::Fail { .. } => "stage_failed",
            PushError::Panicked { .. } => "stage_panicked",
            PushError::Startup { .. } => "startup_failed",
            PushError::NoRuntime => "no_runtime",
            PushError::Abandoned => "source_abandoned",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            PushError::Fail { error } => format!("error: {error}"),
            PushError::Panicked { info } => format!("panic: {info}"),
            PushError::Startup { reason } => format!("startup: {reason}"),
            PushError::NoRuntime => "no tokio runtime".to_string(),
            PushError::Abandoned => "abandoned".to_string(),
        }
    }

    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        PushError::Panicked {
            info: panic_info(payload).into(),
        }
    }
}

/// A release action registered with a [`DisposableRegistry`](crate::DisposableRegistry) that failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to release {resource}: {error}")]
pub struct DisposeError {
    /// Name of the resource (see [`Disposable::name`](crate::Disposable::name)).
    pub resource: Arc<str>,
    /// The underlying error message.
    pub error: Arc<str>,
}

/// # Errors produced by a job's execution context.
///
/// Returned by [`ExecutionContext::configure`](crate::ExecutionContext::configure)
/// and as the overall completion signal of
/// [`ExecutionContext::execute`](crate::ExecutionContext::execute).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// `execute` was called before `configure`.
    #[error("execute called before configure")]
    NotConfigured,

    /// `configure` was called more than once.
    #[error("configuration supplied more than once")]
    AlreadyConfigured,

    /// `execute` was called on a context that already started.
    #[error("execution already started")]
    AlreadyStarted,

    /// A registered stream faulted; the aggregate stopped at the first fault.
    #[error("job faulted: {error}")]
    Faulted {
        /// The first fault observed by the aggregate.
        error: PushError,
        /// Release actions that failed while tearing down after the fault.
        disposal: Vec<DisposeError>,
    },

    /// Every stream completed but some release actions failed.
    #[error("{} release action(s) failed", .errors.len())]
    Disposal {
        /// Every failed release action, in release order.
        errors: Vec<DisposeError>,
    },

    /// A stream registered itself after the aggregate completion resolved.
    #[error("stream {node} registered after completion resolved")]
    LateRegistration {
        /// Fully qualified node path of the late stream.
        node: String,
    },

    /// The trace sink (trace stream or one of its subscribers) failed.
    #[error("trace sink failed: {error}")]
    TraceSinkFailed {
        /// The fault reported by the trace side.
        error: PushError,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use pushflow::RuntimeError;
    ///
    /// assert_eq!(RuntimeError::NotConfigured.as_label(), "runtime_not_configured");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::NotConfigured => "runtime_not_configured",
            RuntimeError::AlreadyConfigured => "runtime_already_configured",
            RuntimeError::AlreadyStarted => "runtime_already_started",
            RuntimeError::Faulted { .. } => "runtime_faulted",
            RuntimeError::Disposal { .. } => "runtime_disposal_failed",
            RuntimeError::LateRegistration { .. } => "runtime_late_registration",
            RuntimeError::TraceSinkFailed { .. } => "runtime_trace_sink_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::NotConfigured => "not configured".to_string(),
            RuntimeError::AlreadyConfigured => "configured twice".to_string(),
            RuntimeError::AlreadyStarted => "already started".to_string(),
            RuntimeError::Faulted { error, disposal } => {
                format!("faulted: {error}; failed releases={}", disposal.len())
            }
            RuntimeError::Disposal { errors } => {
                let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
                format!("disposal failed: {}", details.join("; "))
            }
            RuntimeError::LateRegistration { node } => format!("late registration: {node}"),
            RuntimeError::TraceSinkFailed { error } => format!("trace sink: {error}"),
        }
    }

    /// Returns the originating stream fault, if the job faulted.
    pub fn fault(&self) -> Option<&PushError> {
        match self {
            RuntimeError::Faulted { error, .. } | RuntimeError::TraceSinkFailed { error } => {
                Some(error)
            }
            _ => None,
        }
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_info(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(PushError::fail("x").as_label(), "stage_failed");
        assert_eq!(PushError::Abandoned.as_label(), "source_abandoned");
        assert_eq!(
            RuntimeError::AlreadyStarted.as_label(),
            "runtime_already_started"
        );
    }

    #[test]
    fn test_disposal_message_lists_every_failure() {
        let err = RuntimeError::Disposal {
            errors: vec![
                DisposeError {
                    resource: "file".into(),
                    error: "busy".into(),
                },
                DisposeError {
                    resource: "socket".into(),
                    error: "reset".into(),
                },
            ],
        };
        assert_eq!(err.to_string(), "2 release action(s) failed");
        assert_eq!(
            err.as_message(),
            "disposal failed: failed to release file: busy; failed to release socket: reset"
        );
    }

    #[test]
    fn test_fault_accessor() {
        let err = RuntimeError::Faulted {
            error: PushError::fail("boom"),
            disposal: vec![],
        };
        assert_eq!(err.fault(), Some(&PushError::fail("boom")));
        assert_eq!(RuntimeError::NotConfigured.fault(), None);
    }

    #[test]
    fn test_panic_info_downcasts() {
        let payload: Box<dyn Any + Send> = Box::new("static msg");
        assert_eq!(panic_info(payload.as_ref()), "static msg");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned msg"));
        assert_eq!(panic_info(payload.as_ref()), "owned msg");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_info(payload.as_ref()), "unknown panic");
    }
}
