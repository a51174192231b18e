//! Runtime core: execution scopes, completion and disposal.
//!
//! The public entry point is [`ExecutionContext`], which owns one job's
//! startup channel, trace channel, aggregate completion and disposal registry.
//!
//! Internal modules:
//! - `scope`: what streams share (tracer sink, completion tracker, disposal registry);
//! - `completion`: [`CompletionTracker`], the aggregate wait set;
//! - `disposal`: [`DisposableRegistry`], release actions run once after completion;
//! - `context`: the completion and disposal protocol.

mod builder;
mod completion;
mod config;
mod context;
mod disposal;
mod scope;

pub use builder::ExecutionContextBuilder;
pub use completion::CompletionTracker;
pub use config::ContextConfig;
pub use context::{ContextState, ExecutionContext};
pub use disposal::{BoxError, Disposable, DisposableKey, DisposableRegistry, DisposeFn};
pub(crate) use scope::Scope;
