//! Renderer - mounts descriptions on a host and applies edit scripts.
//!
//! # Architecture
//!
//! ```text
//! VNode ──mount──▶ host tree + Mounted side table
//!                       │
//! diff(old, new) ──apply──▶ host calls, side table updated in step
//! ```
//!
//! The [`Mounted`] table mirrors the description tree and holds the host
//! handle of every node, so the reconciler can stay pure.

mod apply;
mod mount;
mod mounted;

pub use apply::apply;
pub use mount::{create_tree, mount, unmount};
pub use mounted::Mounted;

pub(crate) use mount::{detach, release_quietly, release_subtree};
