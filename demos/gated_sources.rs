//! # Example: gated_sources
//!
//! Two independent generators start at the same moment, gated on the job's
//! start gate, and are merged and combined with the configuration.
//!
//! Demonstrates how to:
//! - Build gated generators with [`operators::range`] and [`operators::from_iter`].
//! - Merge streams and combine them with the latest configuration value.
//! - Attach the built-in [`LogWriter`] trace subscriber through the builder.
//!
//! ## Flow
//! ```text
//! ExecutionContext::builder("gated").with_subscribers([LogWriter]).build()
//!     ├─► low  (Range, gated)  ─┐
//!     ├─► high (Range, gated)  ─┴─► all (Merge) ──► scaled (CombineWithLatest with Startup)
//!     ├─► execute(): startup pushes the factor, gate opens, generators run on tokio tasks
//!     └─► LogWriter prints row counts and the disposal summary
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example gated_sources --features logging
//! ```

use std::sync::Arc;

use pushflow::{operators, ContextConfig, ExecutionContext, LogWriter, Subscribe, TraceLevel};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let ctx = ExecutionContext::<i64>::builder("gated")
        .with_config(ContextConfig {
            min_trace_level: TraceLevel::Info,
            ..ContextConfig::default()
        })
        .with_subscribers(subs)
        .build();

    let gate = ctx.start_gate();
    let low = ctx.stream("low", "Range", operators::range(0, 5, Some(gate.clone())));
    let high = ctx.stream("high", "Range", operators::range(100, 5, Some(gate)));
    let labels = ctx.stream(
        "labels",
        "FromIter",
        operators::from_iter(["alpha", "beta"], Some(ctx.start_gate())),
    );

    let all = low.merge("all", &[&high]);
    let scaled = all.combine_with_latest("scaled", ctx.startup_stream(), |n, factor| n * factor);
    let _tagged = labels.map("tagged", |label| format!("label:{label}"));
    let _big = scaled.filter("big", |n| *n >= 300);

    ctx.configure(3)?;
    ctx.execute().await?;
    println!("execution {} finished", ctx.execution_id());
    Ok(())
}
