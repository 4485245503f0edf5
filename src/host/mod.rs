//! Host adapter - the only way the renderer touches real nodes.
//!
//! A host is whatever owns the concrete tree: a DOM, a terminal widget
//! tree, a test arena. The renderer drives it through [`HostAdapter`] and
//! keeps the returned handles in its own side table.
//!
//! [`MemoryHost`] is an in-memory implementation used by tests and demos.

mod memory;

pub use memory::{HostNodeKind, HostStats, MemoryHost, NodeId};

use std::fmt::Debug;

use crate::error::HostError;
use crate::types::AttrValue;

/// Operations the renderer needs from a host tree.
///
/// Every call may fail; the renderer stops at the first failure and reports
/// it. Attribute values carrying a [`Handler`](crate::types::Handler) are to
/// be bound as event listeners, replacing any previous listener under the
/// same key.
pub trait HostAdapter {
    /// Handle to one host node. Cheap to clone.
    type Handle: Clone + Debug;

    fn create_element(&mut self, tag: &str) -> Result<Self::Handle, HostError>;

    fn create_text(&mut self, content: &str) -> Result<Self::Handle, HostError>;

    fn set_attribute(
        &mut self,
        node: &Self::Handle,
        key: &str,
        value: &AttrValue,
    ) -> Result<(), HostError>;

    fn remove_attribute(&mut self, node: &Self::Handle, key: &str) -> Result<(), HostError>;

    fn set_text(&mut self, node: &Self::Handle, content: &str) -> Result<(), HostError>;

    fn append_child(&mut self, parent: &Self::Handle, child: &Self::Handle)
        -> Result<(), HostError>;

    /// Insert `child` before `anchor`, or at the end when `anchor` is `None`.
    /// A child already attached somewhere is moved.
    fn insert_before(
        &mut self,
        parent: &Self::Handle,
        child: &Self::Handle,
        anchor: Option<&Self::Handle>,
    ) -> Result<(), HostError>;

    fn remove_child(&mut self, parent: &Self::Handle, child: &Self::Handle)
        -> Result<(), HostError>;

    /// Called once for every node of a detached subtree that will never be
    /// used again, children before parents. Hosts unbind listeners here.
    fn release(&mut self, _node: &Self::Handle) -> Result<(), HostError> {
        Ok(())
    }
}
