//! # LogWriter: simple trace printer
//!
//! A minimal subscriber that prints incoming [`TraceEvent`]s to stdout.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [info] nightly (Startup) count=1
//! [info] nightly/parse (Map) count=3
//! [error] nightly/parse/check (Map) faulted: stage failed: zero row
//! [warning] nightly (ExecutionContext) disposed released=1 failed=1
//! ```

use async_trait::async_trait;

use crate::subscribers::Subscribe;
use crate::trace::TraceEvent;

/// Trace writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Renders one event as a log line.
    pub fn format(event: &TraceEvent) -> String {
        format!(
            "[{}] {} {}",
            event.level().as_str(),
            event.node,
            event.content
        )
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &TraceEvent) {
        println!("{}", Self::format(e));
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{NodeInfo, TraceContent};

    #[test]
    fn test_format() {
        let ev = TraceEvent::new(
            uuid::Uuid::nil(),
            "nightly",
            NodeInfo::root("nightly", "Startup").child("parse", "Map"),
            TraceContent::Counter { count: 3 },
        );
        assert_eq!(LogWriter::format(&ev), "[info] nightly/parse (Map) count=3");
    }
}
