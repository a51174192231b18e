use std::fmt;
use std::sync::Arc;

use super::probe::StreamProbe;
use crate::core::{Disposable, DisposableKey, Scope};
use crate::operators::{completion, Completion};
use crate::push::{ObservableRef, Observer, PushObservable, StartGate, Subscription};
use crate::trace::{NodeContext, NodeInfo, Tracer};

/// A push source bound to a node of the pipeline graph and to its execution context.
///
/// `Stream` is itself a [`PushObservable`], so it can be fed to any operator
/// or subscribed to directly.
pub struct Stream<T> {
    scope: Arc<Scope>,
    node: NodeInfo,
    tracer: Option<Tracer>,
    source: ObservableRef<T>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            scope: Arc::clone(&self.scope),
            node: self.node.clone(),
            tracer: self.tracer.clone(),
            source: Arc::clone(&self.source),
        }
    }
}

impl<T: Send + Sync + 'static> Stream<T> {
    /// Wraps `source`, instruments it and registers its completion.
    ///
    /// A generator source is held, so the probe's subscription does not run it;
    /// the scope starts it when the job executes.
    pub(crate) fn attach(scope: Arc<Scope>, node: NodeInfo, source: ObservableRef<T>) -> Self {
        let held = source.hold_start();
        let tracer = scope
            .is_traced()
            .then(|| Tracer::new(Arc::clone(&scope), node.clone()));

        // Probe before tracking: terminal traces must precede the aggregate resolving.
        if let Some(tracer) = &tracer {
            let probe = StreamProbe::new(tracer.clone(), scope.config().count_rows);
            let _attached = source.subscribe(Arc::new(probe));
        }
        scope.track(&node, completion(source.as_ref()));
        if let Some(start) = held {
            scope.hold(start);
        }

        Self {
            scope,
            node,
            tracer,
            source,
        }
    }

    /// Builds a child stream named `name` from an arbitrary push source.
    ///
    /// This is the entry point for stages implemented outside this crate: the
    /// child is registered with the owning context exactly like a built-in stage.
    pub fn derive<U, S>(&self, name: &str, type_label: &str, source: S) -> Stream<U>
    where
        U: Send + Sync + 'static,
        S: PushObservable<U> + 'static,
    {
        Stream::attach(
            Arc::clone(&self.scope),
            self.node.child(name, type_label),
            Arc::new(source),
        )
    }

    /// Future resolving when this stream terminates.
    pub fn completion(&self) -> Completion {
        completion(self.source.as_ref())
    }
}

impl<T> Stream<T> {
    /// Position of this stream in the pipeline graph.
    pub fn node(&self) -> &NodeInfo {
        &self.node
    }

    /// The stage's own name (last element of the node path).
    pub fn name(&self) -> &str {
        self.node.node_name()
    }

    /// The stream's tracer; `None` for the context's trace stream.
    pub fn tracer(&self) -> Option<&Tracer> {
        self.tracer.as_ref()
    }

    /// The underlying push source.
    pub fn source(&self) -> &ObservableRef<T> {
        &self.source
    }

    /// The gate the owning context releases when execution starts.
    ///
    /// Pass it to gated generators so they start together with the job.
    pub fn start_gate(&self) -> StartGate {
        self.scope.gate().clone()
    }

    /// Hands `resource` to the owning context's disposal registry.
    pub fn add_disposable(&self, resource: impl Disposable) -> DisposableKey {
        self.scope.add_disposable(Box::new(resource))
    }
}

impl<T: 'static> PushObservable<T> for Stream<T> {
    fn subscribe(&self, observer: Arc<dyn Observer<T>>) -> Subscription {
        self.source.subscribe(observer)
    }
}

impl<T> NodeContext for Stream<T> {
    fn node_path(&self) -> &[Arc<str>] {
        self.node.node_path()
    }

    fn type_label(&self) -> &str {
        self.node.type_label()
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("node", &self.node)
            .field("traced", &self.tracer.is_some())
            .finish()
    }
}
