//! Operators deriving new push sources from existing ones.
//!
//! Every operator subscribes to its input(s) **at construction** and exposes
//! its output through an inner [`PushSubject`](crate::PushSubject), so the
//! result is itself a [`PushObservable`](crate::PushObservable) and operators
//! chain arbitrarily deep.
//!
//! ## Contents
//! | Operator                 | Output                                                     | Terminates when                     |
//! |--------------------------|------------------------------------------------------------|-------------------------------------|
//! | [`FilterSubject`]        | values accepted by an [`AcceptValue`] predicate            | input terminates                    |
//! | [`distinct`]/[`distinct_by`] | first occurrence of each value (by comparer)           | input terminates                    |
//! | [`filter`]               | values matching a closure                                  | input terminates                    |
//! | [`map`]/[`try_map`]      | transformed values                                         | input terminates / mapping fails    |
//! | [`merge`]                | every value of every input                                 | **all** complete / **any** faults   |
//! | [`combine_with_latest`]  | `selector(latest_a, latest_b)` once both sides emitted     | **both** complete / **any** faults  |
//! | [`first`]                | the first value                                            | first value / input terminates      |
//! | [`range`]/[`empty`]/[`from_iter`] | deferred finite generators, optionally gated      | sequence exhausted                  |
//!
//! [`completion`] turns any source into a future resolving on its terminal signal.
//!
//! ## Fault policy
//! Nothing is caught silently: a fault on any input is forwarded as the
//! output's terminal fault, and multi-input operators detach from their other
//! inputs (fail-fast). Panics inside user callbacks become
//! [`PushError::Panicked`](crate::PushError::Panicked).

mod combine;
mod completion;
mod distinct;
mod filter;
mod first;
mod map;
mod merge;
mod sources;

pub use combine::{combine_with_latest, CombineWithLatest};
pub use completion::{completion, Completion};
pub use distinct::{distinct, distinct_by, DistinctFilter};
pub use filter::{filter, AcceptValue, FilterSubject, FnFilter};
pub use first::{first, FirstSubject};
pub use map::{map, try_map, MapSubject};
pub use merge::{merge, MergeSubject};
pub use sources::{empty, from_iter, range};
