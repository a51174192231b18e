//! Push sources: observers, subjects and subscriptions.
//!
//! This module groups the **leaf** of the engine: a multicast, push-only
//! emitter and the contracts around it.
//!
//! ## Contents
//! - [`Observer`], [`FnObserver`] receive values and one terminal signal
//! - [`PushObservable`] anything that can be subscribed to
//! - [`PushSubject`] the multicast source every operator is built on
//! - [`Subscription`] handle that detaches an observer
//! - [`StartGate`], [`DeferredPushObservable`] gated generators
//!
//! ## Delivery model
//! ```text
//! producer thread ── push_value(v) ──► PushSubject
//!                                        │ snapshot observers (subscription order)
//!                                        ├─► observer 1.on_next(&v)
//!                                        ├─► observer 2.on_next(&v)   (skipped if unsubscribed meanwhile)
//!                                        └─► observer N.on_next(&v)
//! ```
//!
//! ## Rules
//! - Delivery is synchronous on the pushing thread; no buffering.
//! - One terminal signal (`complete` **or** `fault`) per source, delivered at
//!   most once to each observer; later pushes and terminals are ignored.
//! - Late subscribers to a terminated source receive the terminal signal
//!   immediately, without values.

mod deferred;
mod gate;
mod observable;
mod observer;
mod subject;
mod subscription;

pub use deferred::{DeferredPushObservable, Generator};
pub use gate::StartGate;
pub use observable::{ObservableRef, PushObservable, Starter};
pub use observer::{FnObserver, Observer};
pub use subject::PushSubject;
pub use subscription::Subscription;
