//! # spark-vdom
//!
//! Virtual tree reconciler with fine-grained reactivity.
//!
//! ## Architecture
//!
//! A UI is described as a tree of plain values ([`VNode`]). When state
//! changes, a new description is rendered and compared with the previous
//! one; the difference is an [`EditScript`] applied to a host tree through a
//! [`HostAdapter`]. Reactive records track which render read which field,
//! and a scheduler batches the resulting re-renders:
//!
//! ```text
//! Reactive write → render effect → Scheduler (batch) → diff → apply → HostAdapter
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Keys, attribute values, patch flags
//! - [`vnode`] - Tree descriptions and builders
//! - [`reconcile`] - The diff: edit scripts, keyed children, LIS
//! - [`renderer`] - Mounting and applying scripts to a host
//! - [`host`] - The host adapter trait and an in-memory host
//! - [`reactive`] - Tracked records and effects
//! - [`scheduler`] - Batched update queue
//! - [`pipeline`] - [`App`]: render effect wired to the scheduler

pub mod error;
pub mod host;
pub mod pipeline;
pub mod reactive;
pub mod reconcile;
pub mod renderer;
pub mod scheduler;
pub mod types;
pub mod vnode;

// Re-export commonly used items
pub use types::*;

pub use error::{HostError, RenderError, Result};

pub use vnode::{component, element, text, ComponentNode, ElementNode, Props, TextNode, VNode};

pub use reconcile::{diff, longest_increasing_subsequence, DiffStats, EditScript, PatchOp};

pub use renderer::{apply, mount, unmount, Mounted};

pub use host::{HostAdapter, MemoryHost, NodeId};

pub use reactive::{effect, reactive, untrack, EffectHandle, Reactive};

pub use scheduler::{flush, queue_update, FlushReport, Scheduler, SchedulerConfig};

pub use pipeline::App;
