//! # Example: simple_job
//!
//! Minimal job: the configuration value fans out into a small pipeline.
//!
//! Demonstrates how to:
//! - Write an external stage and attach it with [`Stream::derive`].
//! - Chain built-in stages (`try_map`, `filter`, `distinct`).
//! - Register a resource with the job's disposal registry.
//! - Read the trace stream directly as a push source.
//!
//! ## Flow
//! ```text
//! configure(["3", "x", "3", "7"]) ──► execute()
//!     ├─► simple-job (Startup) ──► rows (Split) ──► numbers (Filter) ──► parsed (Map) ──► unique (Distinct)
//!     ├─► every stream terminates ──► dispose "report"
//!     └─► trace channel completes
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example simple_job
//! ```

use std::sync::{Arc, Mutex};

use pushflow::{
    DisposeFn, ExecutionContext, FnObserver, Observer, PushError, PushObservable, PushSubject,
    Subscription, TraceEvent,
};

/// External stage: pushes every element of each incoming batch.
struct Split<T> {
    subject: PushSubject<T>,
}

impl<T: Clone + Send + Sync + 'static> Split<T> {
    fn new(source: &dyn PushObservable<Vec<T>>) -> Self {
        let subject = PushSubject::new();
        let (out, done, failed) = (subject.clone(), subject.clone(), subject.clone());
        source.subscribe(
            FnObserver::new(move |batch: &Vec<T>| {
                for item in batch {
                    out.push_value(item.clone());
                }
            })
            .with_completed(move || {
                done.complete();
            })
            .with_error(move |e: &PushError| {
                failed.fault(e.clone());
            })
            .arc(),
        );
        Self { subject }
    }
}

impl<T: 'static> PushObservable<T> for Split<T> {
    fn subscribe(&self, observer: Arc<dyn Observer<T>>) -> Subscription {
        self.subject.subscribe(observer)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = ExecutionContext::<Vec<&'static str>>::new("simple-job");

    ctx.trace_stream().subscribe(
        FnObserver::new(|ev: &TraceEvent| {
            println!("[trace #{}] {} {}", ev.seq, ev.node, ev.content);
        })
        .arc(),
    );

    let startup = ctx.startup_stream();
    let rows = startup.derive("rows", "Split", Split::new(startup.source().as_ref()));
    let unique = rows
        .filter("numbers", |raw| raw.chars().all(|c| c.is_ascii_digit()))
        .try_map("parsed", |raw| {
            raw.parse::<u32>()
                .map_err(|e| PushError::fail(format!("{raw}: {e}")))
        })
        .distinct("unique");

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    unique.subscribe(FnObserver::new(move |n: &u32| sink.lock().unwrap().push(*n)).arc());

    ctx.add_disposable(DisposeFn::new("report", move || {
        println!("[report] unique={:?}", seen.lock().unwrap());
        Ok(())
    }));

    ctx.configure(vec!["3", "x", "3", "7"])?;
    ctx.execute().await?;
    Ok(())
}
