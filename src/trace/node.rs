//! Hierarchical node identity.

use std::fmt;
use std::sync::Arc;

/// Capability shared by everything that sits at a position of the pipeline graph.
pub trait NodeContext {
    /// Ordered name path, root (job name) first.
    fn node_path(&self) -> &[Arc<str>];

    /// Kind of stage (`"Map"`, `"Merge"`, `"Startup"`, ...).
    fn type_label(&self) -> &str;

    /// Last element of the path (the stage's own name).
    fn node_name(&self) -> &str {
        self.node_path().last().map_or("", |name| name.as_ref())
    }

    /// Path joined with `/`, e.g. `job/Startup/parse`.
    fn qualified_name(&self) -> String {
        let parts: Vec<&str> = self.node_path().iter().map(|p| p.as_ref()).collect();
        parts.join("/")
    }
}

/// Immutable node identity: name path plus type label.
///
/// Cheap to clone; children share nothing mutable with their parent.
///
/// # Example
/// ```
/// use pushflow::{NodeContext, NodeInfo};
///
/// let root = NodeInfo::root("nightly", "Startup");
/// let parse = root.child("parse", "Map");
/// assert_eq!(parse.qualified_name(), "nightly/parse");
/// assert_eq!(parse.type_label(), "Map");
/// assert_eq!(root.node_path().len(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeInfo {
    path: Arc<[Arc<str>]>,
    type_label: Arc<str>,
}

impl NodeInfo {
    /// A root node whose path is the job name alone.
    pub fn root(job_name: impl Into<Arc<str>>, type_label: impl Into<Arc<str>>) -> Self {
        Self {
            path: Arc::from(vec![job_name.into()]),
            type_label: type_label.into(),
        }
    }

    /// A node one level below `self`.
    pub fn child(&self, name: impl Into<Arc<str>>, type_label: impl Into<Arc<str>>) -> Self {
        let mut path: Vec<Arc<str>> = self.path.to_vec();
        path.push(name.into());
        Self {
            path: Arc::from(path),
            type_label: type_label.into(),
        }
    }
}

impl NodeContext for NodeInfo {
    fn node_path(&self) -> &[Arc<str>] {
        &self.path
    }

    fn type_label(&self) -> &str {
        &self.type_label
    }
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.qualified_name(), self.type_label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_appends_to_parent_path() {
        let root = NodeInfo::root("job", "Startup");
        let a = root.child("a", "Map");
        let b = a.child("b", "Filter");

        assert_eq!(root.qualified_name(), "job");
        assert_eq!(b.qualified_name(), "job/a/b");
        assert_eq!(b.node_name(), "b");
        assert_eq!(a.node_path().len(), 2);
        assert_eq!(b.to_string(), "job/a/b (Filter)");
    }
}
