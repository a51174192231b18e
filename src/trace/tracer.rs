//! Per-node trace emitter.

use std::fmt;
use std::sync::Arc;

use super::{NodeContext, NodeInfo, TraceContent};
use crate::core::Scope;

/// Emits trace events attributed to one node.
///
/// Obtained from [`Stream::tracer`](crate::Stream::tracer); external stages use
/// it to report their own progress under their stream's node path.
#[derive(Clone)]
pub struct Tracer {
    scope: Arc<Scope>,
    node: NodeInfo,
}

impl Tracer {
    pub(crate) fn new(scope: Arc<Scope>, node: NodeInfo) -> Self {
        Self { scope, node }
    }

    /// The node this tracer reports for.
    pub fn node(&self) -> &NodeInfo {
        &self.node
    }

    /// Pushes `content` onto the trace channel, unless its level is filtered out.
    pub fn trace(&self, content: TraceContent) {
        self.scope.trace(&self.node, content);
    }

    /// A tracer for a node one level below this one.
    pub fn child(&self, name: impl Into<Arc<str>>, type_label: impl Into<Arc<str>>) -> Tracer {
        Tracer::new(Arc::clone(&self.scope), self.node.child(name, type_label))
    }
}

impl NodeContext for Tracer {
    fn node_path(&self) -> &[Arc<str>] {
        self.node.node_path()
    }

    fn type_label(&self) -> &str {
        self.node.type_label()
    }
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer").field("node", &self.node).finish()
    }
}
