use std::marker::PhantomData;
use std::sync::Arc;

use super::{ContextConfig, ExecutionContext};
use crate::subscribers::Subscribe;

/// Builder for an [`ExecutionContext`] with optional settings.
pub struct ExecutionContextBuilder<C> {
    job_name: Arc<str>,
    config: ContextConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    _config: PhantomData<fn() -> C>,
}

impl<C: Clone + Send + Sync + 'static> ExecutionContextBuilder<C> {
    /// Creates a builder with the default [`ContextConfig`] and no subscribers.
    pub fn new(job_name: impl Into<Arc<str>>) -> Self {
        Self {
            job_name: job_name.into(),
            config: ContextConfig::default(),
            subscribers: Vec::new(),
            _config: PhantomData,
        }
    }

    /// Replaces the context configuration.
    pub fn with_config(mut self, config: ContextConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets trace subscribers.
    ///
    /// Subscribers receive every trace event that passes
    /// [`ContextConfig::min_trace_level`] through dedicated workers, started
    /// when the job executes.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the context.
    ///
    /// This consumes the builder and wires:
    /// - the main and trace execution scopes
    /// - the trace channel and its subscriber queues
    /// - the startup stream
    ///
    /// No tokio runtime is needed until [`ExecutionContext::execute`].
    pub fn build(self) -> ExecutionContext<C> {
        ExecutionContext::from_parts(self.job_name, self.config, self.subscribers)
    }
}
