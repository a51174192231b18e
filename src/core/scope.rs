//! Execution scope shared by the streams of one context.
//!
//! A context owns two scopes: the **main** scope (pipeline streams, traces to
//! the trace channel) and the **trace** scope (the trace stream only, never
//! traces). Each has its own completion tracker and disposal registry, so the
//! context can resolve the main scope first and only then close the trace side.
//!
//! Generators wrapped in a stream are held by their scope and started by
//! [`start_held`](Scope::start_held) once the job executes; a generator
//! attached after that point starts as soon as its stream is wired.

use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use super::{CompletionTracker, ContextConfig, Disposable, DisposableKey, DisposableRegistry};
use crate::operators::Completion;
use crate::push::{PushSubject, StartGate, Starter};
use crate::trace::{NodeContext, NodeInfo, TraceContent, TraceEvent};

pub(crate) struct Scope {
    job_name: Arc<str>,
    execution_id: Uuid,
    config: ContextConfig,
    gate: StartGate,
    sink: Option<PushSubject<TraceEvent>>,
    pub(crate) tracker: CompletionTracker,
    pub(crate) disposables: DisposableRegistry,
    held: Mutex<HeldStarts>,
}

#[derive(Default)]
struct HeldStarts {
    released: bool,
    pending: Vec<Starter>,
}

impl Scope {
    pub(crate) fn new(
        job_name: Arc<str>,
        execution_id: Uuid,
        config: ContextConfig,
        gate: StartGate,
        sink: Option<PushSubject<TraceEvent>>,
    ) -> Self {
        Self {
            job_name,
            execution_id,
            config,
            gate,
            sink,
            tracker: CompletionTracker::new(),
            disposables: DisposableRegistry::new(),
            held: Mutex::new(HeldStarts::default()),
        }
    }

    pub(crate) fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub(crate) fn gate(&self) -> &StartGate {
        &self.gate
    }

    /// Returns true if this scope pushes trace events at all.
    pub(crate) fn is_traced(&self) -> bool {
        self.sink.is_some()
    }

    pub(crate) fn trace(&self, node: &NodeInfo, content: TraceContent) {
        let Some(sink) = &self.sink else {
            return;
        };
        if !self.config.traces(content.level()) {
            return;
        }
        sink.push_value(TraceEvent::new(
            self.execution_id,
            Arc::clone(&self.job_name),
            node.clone(),
            content,
        ));
    }

    /// Registers `completion` with the aggregate; a late registration is traced
    /// and recorded for the job result.
    pub(crate) fn track(&self, node: &NodeInfo, completion: Completion) {
        let name = node.qualified_name();
        if let Err(err) = self.tracker.track(&name, completion) {
            tracing::warn!(node = %name, "{}", err.as_message());
            self.trace(node, TraceContent::error(err.to_string()));
        }
    }

    pub(crate) fn add_disposable(&self, resource: Box<dyn Disposable>) -> DisposableKey {
        self.disposables.add_boxed(resource)
    }

    /// Queues `start` until [`start_held`](Self::start_held); runs it at once
    /// if that already happened.
    pub(crate) fn hold(&self, start: Starter) {
        let mut held = self.held.lock();
        if held.released {
            drop(held);
            start();
        } else {
            held.pending.push(start);
        }
    }

    /// Starts every held generator, in attachment order.
    pub(crate) fn start_held(&self) {
        let pending = {
            let mut held = self.held.lock();
            held.released = true;
            std::mem::take(&mut held.pending)
        };
        tracing::debug!(job = %self.job_name, generators = pending.len(), "starting held generators");
        for start in pending {
            start();
        }
    }
}
