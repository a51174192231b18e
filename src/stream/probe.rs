//! Lifecycle instrumentation attached to every traced stream.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::PushError;
use crate::push::Observer;
use crate::trace::{TraceContent, Tracer};

/// Counts rows and traces the terminal signal of one stream.
pub(super) struct StreamProbe {
    tracer: Tracer,
    count_rows: bool,
    rows: AtomicU64,
}

impl StreamProbe {
    pub(super) fn new(tracer: Tracer, count_rows: bool) -> Self {
        Self {
            tracer,
            count_rows,
            rows: AtomicU64::new(0),
        }
    }
}

impl<T> Observer<T> for StreamProbe {
    fn on_next(&self, _value: &T) {
        self.rows.fetch_add(1, Ordering::Relaxed);
    }

    fn on_completed(&self) {
        if self.count_rows {
            self.tracer.trace(TraceContent::Counter {
                count: self.rows.load(Ordering::Relaxed),
            });
        }
    }

    fn on_error(&self, error: &PushError) {
        self.tracer.trace(TraceContent::Faulted {
            error: error.clone(),
        });
    }
}
