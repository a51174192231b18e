//! # ExecutionContext: completion and disposal protocol
//!
//! One [`ExecutionContext`] drives one job. Pipeline authors hang stages off
//! its startup stream (and any extra sources), call [`configure`] with the job
//! configuration and then await [`execute`].
//!
//! ## Lifecycle
//! ```text
//! Created ── execute() ──► Running ──────────────────────────────► Completed
//!                            │
//!                            ├─ 1. push config into startup channel, complete it (single-shot)
//!                            ├─ 2. release the start gate, start generators held by streams
//!                            ├─ 3. await main aggregate (every registered stream; first fault wins)
//!                            ├─ 4. dispose main registry (LIFO, every action once, even on fault)
//!                            ├─ 5. complete the trace channel
//!                            ├─ 6. await trace aggregate, drain subscriber queues
//!                            └─ 7. dispose trace registry, build the job result
//! ```
//!
//! ## Rules
//! - Trace completion happens strictly after main completion and disposal, so
//!   events emitted during teardown still reach subscribers.
//! - Configuration errors fault the startup channel with
//!   [`PushError::Startup`]; the job result reports the configuration error.
//! - Result priority: configuration error, stream fault, disposal failures,
//!   late registration, trace sink failure.
//! - If the `execute` future is dropped before it finished (a timeout, a
//!   cancelled task) or unwinds from a panicking observer, registered
//!   resources are still released and the trace channel is completed; the
//!   context ends up `Completed`.
//!
//! [`configure`]: ExecutionContext::configure
//! [`execute`]: ExecutionContext::execute

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use super::{ContextConfig, Disposable, DisposableKey, ExecutionContextBuilder, Scope};
use crate::error::{PushError, RuntimeError};
use crate::operators;
use crate::push::{PushObservable, PushSubject, StartGate};
use crate::stream::Stream;
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::trace::{NodeInfo, TraceContent, TraceEvent, Tracer};

/// Lifecycle state of an [`ExecutionContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Pipeline under construction; `execute` not called yet.
    Created,
    /// `execute` is running.
    Running,
    /// `execute` returned.
    Completed,
}

enum ConfigSlot<C> {
    Empty,
    Ready(C),
    Conflict,
}

/// Execution context of one job, generic over the job configuration `C`.
///
/// # Example
/// ```
/// use pushflow::{DisposeFn, ExecutionContext, PushObservable, FnObserver};
/// use std::sync::{Arc, Mutex};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let ctx = ExecutionContext::<&'static str>::new("greeter");
/// let greeting = ctx.startup_stream().map("greet", |name| format!("hello {name}"));
///
/// let out = Arc::new(Mutex::new(Vec::new()));
/// let sink = out.clone();
/// greeting.subscribe(FnObserver::new(move |s: &String| sink.lock().unwrap().push(s.clone())).arc());
/// let log = out.clone();
/// ctx.add_disposable(DisposeFn::new("report", move || {
///     log.lock().unwrap().push("released".into());
///     Ok(())
/// }));
///
/// ctx.configure("world").unwrap();
/// ctx.execute().await.unwrap();
/// assert_eq!(*out.lock().unwrap(), vec!["hello world", "released"]);
/// # }
/// ```
pub struct ExecutionContext<C> {
    job_name: Arc<str>,
    execution_id: Uuid,
    config: ContextConfig,
    main: Arc<Scope>,
    trace_scope: Arc<Scope>,
    trace_subject: PushSubject<TraceEvent>,
    trace_stream: Stream<TraceEvent>,
    startup_subject: PushSubject<C>,
    startup: Stream<C>,
    tracer: Tracer,
    subscribers: Arc<SubscriberSet>,
    slot: Mutex<ConfigSlot<C>>,
    state: Mutex<ContextState>,
}

impl<C: Clone + Send + Sync + 'static> ExecutionContext<C> {
    /// Creates a context with default settings and no trace subscribers.
    pub fn new(job_name: impl Into<Arc<str>>) -> Self {
        Self::builder(job_name).build()
    }

    /// Returns a builder for a context named `job_name`.
    pub fn builder(job_name: impl Into<Arc<str>>) -> ExecutionContextBuilder<C> {
        ExecutionContextBuilder::new(job_name)
    }

    pub(crate) fn from_parts(
        job_name: Arc<str>,
        config: ContextConfig,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        let execution_id = Uuid::new_v4();
        let gate = StartGate::new();
        let trace_subject = PushSubject::new();

        let main = Arc::new(Scope::new(
            Arc::clone(&job_name),
            execution_id,
            config.clone(),
            gate.clone(),
            Some(trace_subject.clone()),
        ));
        let trace_scope = Arc::new(Scope::new(
            Arc::clone(&job_name),
            execution_id,
            config.clone(),
            gate,
            None,
        ));

        let trace_stream = Stream::attach(
            Arc::clone(&trace_scope),
            NodeInfo::root(Arc::clone(&job_name), "Trace"),
            Arc::new(trace_subject.clone()),
        );
        let subscribers = Arc::new(SubscriberSet::new(subscribers, config.queue_capacity()));
        if !subscribers.is_empty() {
            let _attached = trace_stream.subscribe(subscribers.clone());
        }

        let startup_subject = PushSubject::new();
        let startup = Stream::attach(
            Arc::clone(&main),
            NodeInfo::root(Arc::clone(&job_name), "Startup"),
            Arc::new(operators::first(&startup_subject)),
        );
        let tracer = Tracer::new(
            Arc::clone(&main),
            NodeInfo::root(Arc::clone(&job_name), "ExecutionContext"),
        );

        tracing::debug!(job = %job_name, %execution_id, "execution context created");
        Self {
            job_name,
            execution_id,
            config,
            main,
            trace_scope,
            trace_subject,
            trace_stream,
            startup_subject,
            startup,
            tracer,
            subscribers,
            slot: Mutex::new(ConfigSlot::Empty),
            state: Mutex::new(ContextState::Created),
        }
    }

    /// Supplies the job configuration, delivered once through the startup stream.
    ///
    /// # Errors
    /// - [`RuntimeError::AlreadyStarted`] once `execute` was called.
    /// - [`RuntimeError::AlreadyConfigured`] on a second call; the job is then
    ///   poisoned and `execute` fails the startup channel.
    pub fn configure(&self, config: C) -> Result<(), RuntimeError> {
        if self.state() != ContextState::Created {
            return Err(RuntimeError::AlreadyStarted);
        }
        let mut slot = self.slot.lock();
        if matches!(*slot, ConfigSlot::Empty) {
            *slot = ConfigSlot::Ready(config);
            return Ok(());
        }
        *slot = ConfigSlot::Conflict;
        drop(slot);
        tracing::warn!(job = %self.job_name, "configuration supplied more than once");
        Err(RuntimeError::AlreadyConfigured)
    }

    /// Runs the job and resolves once everything registered has terminated,
    /// resources were released and the trace channel was drained.
    ///
    /// # Errors
    /// See [`RuntimeError`]; when several things fail, the configuration
    /// error wins, then the first stream fault, then disposal failures, then
    /// late registrations, then trace sink failures.
    pub async fn execute(&self) -> Result<(), RuntimeError> {
        {
            let mut state = self.state.lock();
            if *state != ContextState::Created {
                return Err(RuntimeError::AlreadyStarted);
            }
            *state = ContextState::Running;
        }
        let mut teardown = Teardown {
            context: self,
            armed: true,
        };
        tracing::info!(job = %self.job_name, execution_id = %self.execution_id, "execution started");
        self.subscribers.start();

        let config_error = self.emit_startup();
        self.main.gate().release();
        self.main.start_held();

        let outcome = self.main.tracker.wait_all().await;
        if let Err(error) = &outcome {
            tracing::warn!(job = %self.job_name, error = %error, "job faulted");
        }

        let registered = self.main.disposables.len();
        let mut disposal = self.main.disposables.dispose_all();
        self.tracer.trace(TraceContent::Disposed {
            released: registered.saturating_sub(disposal.len()),
            failed: disposal.len(),
        });

        self.trace_subject.complete();
        let trace_outcome = self.trace_scope.tracker.wait_all().await;
        self.subscribers.shutdown().await;
        disposal.extend(self.trace_scope.disposables.dispose_all());

        *self.state.lock() = ContextState::Completed;
        teardown.armed = false;
        let late = self.main.tracker.late_registrations();
        tracing::info!(
            job = %self.job_name,
            faulted = outcome.is_err(),
            failed_releases = disposal.len(),
            late = late.len(),
            "execution completed"
        );

        if let Some(error) = config_error {
            return Err(error);
        }
        if let Err(error) = outcome {
            return Err(RuntimeError::Faulted { error, disposal });
        }
        if !disposal.is_empty() {
            return Err(RuntimeError::Disposal { errors: disposal });
        }
        if let Some(node) = late.into_iter().next() {
            return Err(RuntimeError::LateRegistration { node });
        }
        trace_outcome.map_err(|error| RuntimeError::TraceSinkFailed { error })
    }

    /// Releases what `execute` left behind when it was dropped or unwound
    /// before reaching the end.
    fn abandon(&self) {
        let registered = self.main.disposables.len();
        let failed = self.main.disposables.dispose_all().len();
        tracing::warn!(
            job = %self.job_name,
            released = registered.saturating_sub(failed),
            failed,
            "execution abandoned; released registered resources"
        );
        let closed = panic::catch_unwind(AssertUnwindSafe(|| {
            self.tracer.trace(TraceContent::Disposed {
                released: registered.saturating_sub(failed),
                failed,
            });
            self.trace_subject.complete();
        }));
        if closed.is_err() {
            tracing::warn!(job = %self.job_name, "trace observer panicked while closing the trace channel");
        }
        self.subscribers.close();
        *self.state.lock() = ContextState::Completed;
    }

    fn emit_startup(&self) -> Option<RuntimeError> {
        let slot = std::mem::replace(&mut *self.slot.lock(), ConfigSlot::Empty);
        let error = match slot {
            ConfigSlot::Ready(config) => {
                self.startup_subject.push_value(config);
                self.startup_subject.complete();
                return None;
            }
            ConfigSlot::Empty => RuntimeError::NotConfigured,
            ConfigSlot::Conflict => RuntimeError::AlreadyConfigured,
        };
        self.startup_subject.fault(PushError::Startup {
            reason: error.to_string().into(),
        });
        Some(error)
    }

    /// Registers one more completion of `stream` with the aggregate.
    ///
    /// Streams built through this crate register themselves; use this for
    /// extra sub-tasks. A stream that never terminates keeps `execute`
    /// pending forever.
    pub fn wait_completion<T: Send + Sync + 'static>(&self, stream: &Stream<T>) {
        self.main.track(stream.node(), stream.completion());
    }

    /// Wraps an extra source as a root-level stream named `job/<name>`.
    ///
    /// Generators ([`range`](crate::operators::range),
    /// [`DeferredPushObservable`](crate::DeferredPushObservable), ...) wrapped
    /// here do not run while the pipeline is built: gated or not, they start
    /// when `execute` releases the start gate, so every stage derived from
    /// the stream sees all their values.
    pub fn stream<T, S>(&self, name: &str, type_label: &str, source: S) -> Stream<T>
    where
        T: Send + Sync + 'static,
        S: PushObservable<T> + 'static,
    {
        let node = NodeInfo::root(Arc::clone(&self.job_name), "Job").child(name, type_label);
        Stream::attach(Arc::clone(&self.main), node, Arc::new(source))
    }

    /// Hands `resource` to the disposal registry.
    pub fn add_disposable(&self, resource: impl Disposable) -> DisposableKey {
        self.main.add_disposable(Box::new(resource))
    }

    /// Takes a resource back from the disposal registry without releasing it.
    pub fn remove_disposable(&self, key: DisposableKey) -> bool {
        self.main.disposables.remove(key).is_some()
    }

    /// Pushes a context-level trace event.
    pub fn trace(&self, content: TraceContent) {
        self.tracer.trace(content);
    }
}

impl<C> ExecutionContext<C> {
    /// Current lifecycle state.
    pub fn state(&self) -> ContextState {
        *self.state.lock()
    }

    /// Job name (root of every node path).
    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// Process-unique identifier of this execution.
    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    /// Context settings.
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// The single-value configuration stream every pipeline starts from.
    pub fn startup_stream(&self) -> &Stream<C> {
        &self.startup
    }

    /// Every trace event of the job; completes after the main aggregate.
    pub fn trace_stream(&self) -> &Stream<TraceEvent> {
        &self.trace_stream
    }

    /// The gate released when `execute` starts.
    pub fn start_gate(&self) -> StartGate {
        self.main.gate().clone()
    }
}

/// Tears the job down if the `execute` future is dropped (e.g. by a timeout)
/// or unwinds before it finished.
struct Teardown<'a, C: Clone + Send + Sync + 'static> {
    context: &'a ExecutionContext<C>,
    armed: bool,
}

impl<C: Clone + Send + Sync + 'static> Drop for Teardown<'_, C> {
    fn drop(&mut self) {
        if self.armed {
            self.context.abandon();
        }
    }
}

impl<C> fmt::Debug for ExecutionContext<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("job_name", &self.job_name)
            .field("execution_id", &self.execution_id)
            .field("state", &self.state())
            .finish()
    }
}
