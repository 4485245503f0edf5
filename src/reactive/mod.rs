//! Dependency-tracking reactivity.
//!
//! - [`reactive`] wraps a record; reads are tracked per field, writes notify
//! - [`effect`] runs a computation and re-runs it when a field it read changes
//! - [`untrack`] suspends tracking for a closure
//!
//! # Architecture
//!
//! ```text
//! Reactive<T>.read(field)  ──track──▶  graph[subject][field] += top of stack
//! Reactive<T>.write(field) ──trigger─▶ run each subscriber (creation order)
//! ```
//!
//! The runtime is thread-local and everything here is `!Send`: reactivity
//! lives on one thread.
//!
//! # Invariants
//!
//! 1. A read registers against the computation on top of the stack, never an
//!    outer one.
//! 2. An effect's subscriptions are exactly the fields read in its latest run.
//! 3. A write runs every current subscriber of the written field, once.
//! 4. A running effect is never re-entered.

mod effect;
mod runtime;
mod store;

pub use effect::{effect, EffectHandle};
pub use runtime::{
    active_effect, effect_count, reset_runtime, subscriber_count, untrack, EffectId, SubjectId,
};
pub use store::{reactive, Reactive};
