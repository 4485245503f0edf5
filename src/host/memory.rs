//! In-memory host tree.
//!
//! Nodes live in an arena indexed by [`NodeId`] and are never freed, only
//! marked released, so stale handles are caught instead of aliased.

use std::collections::BTreeMap;
use std::fmt;

use super::HostAdapter;
use crate::error::HostError;
use crate::types::{AttrValue, Handler};

/// Handle to a node of a [`MemoryHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostNodeKind {
    Element {
        tag: String,
        attrs: BTreeMap<String, AttrValue>,
    },
    Text(String),
}

#[derive(Debug)]
struct HostNode {
    kind: HostNodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    released: bool,
}

/// Counters of adapter calls that succeeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStats {
    pub created: usize,
    pub attribute_writes: usize,
    pub text_writes: usize,
    pub inserts: usize,
    pub removes: usize,
    pub released: usize,
}

impl HostStats {
    /// Calls that changed the tree (everything but `release`).
    pub fn mutations(&self) -> usize {
        self.created + self.attribute_writes + self.text_writes + self.inserts + self.removes
    }
}

/// A [`HostAdapter`] backed by an arena.
///
/// Besides the adapter calls it offers inspection (`children`, `attribute`,
/// `to_markup`), call counters and failure injection.
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: Vec<HostNode>,
    stats: HostStats,
    /// Calls left before every call fails.
    fail_budget: Option<usize>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached element to mount into. Not counted, never fails.
    pub fn create_root(&mut self, tag: &str) -> NodeId {
        self.push(HostNodeKind::Element {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
        })
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Children of `id`; empty for unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn kind(&self, id: NodeId) -> Option<&HostNodeKind> {
        self.nodes.get(id.0).map(|n| &n.kind)
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            HostNodeKind::Element { tag, .. } => Some(tag),
            HostNodeKind::Text(_) => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            HostNodeKind::Text(content) => Some(content),
            HostNodeKind::Element { .. } => None,
        }
    }

    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&AttrValue> {
        match self.kind(id)? {
            HostNodeKind::Element { attrs, .. } => attrs.get(key),
            HostNodeKind::Text(_) => None,
        }
    }

    /// Listener bound under `key`, cloned so it can be called without
    /// borrowing the host.
    pub fn handler(&self, id: NodeId, key: &str) -> Option<Handler> {
        match self.attribute(id, key)? {
            AttrValue::Handler(handler) => Some(handler.clone()),
            _ => None,
        }
    }

    /// First node under `root` (depth first, `root` included) whose `key`
    /// attribute displays as `value`.
    pub fn find_by_attribute(&self, root: NodeId, key: &str, value: &str) -> Option<NodeId> {
        if self
            .attribute(root, key)
            .is_some_and(|attr| attr.to_string() == value)
        {
            return Some(root);
        }
        self.children(root)
            .iter()
            .find_map(|&child| self.find_by_attribute(child, key, value))
    }

    /// Concatenated text of every text node under `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(HostNodeKind::Text(content)) => out.push_str(content),
            Some(HostNodeKind::Element { .. }) => {
                for &child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
            None => {}
        }
    }

    /// Serialize `id` and its subtree, e.g. `<li key="a">Item A</li>`.
    pub fn to_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    /// Serialize the children of `id` only.
    pub fn inner_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_markup(child, &mut out);
        }
        out
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(HostNodeKind::Text(content)) => out.push_str(content),
            Some(HostNodeKind::Element { tag, attrs }) => {
                out.push('<');
                out.push_str(tag);
                for (key, value) in attrs {
                    out.push_str(&format!(" {key}=\"{value}\""));
                }
                out.push('>');
                for &child in self.children(id) {
                    self.write_markup(child, out);
                }
                out.push_str(&format!("</{tag}>"));
            }
            None => {}
        }
    }

    pub fn is_released(&self, id: NodeId) -> bool {
        self.nodes.get(id.0).is_some_and(|n| n.released)
    }

    /// Nodes created and not yet released, attached or not.
    pub fn live_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.released).count()
    }

    // =========================================================================
    // Stats and failure injection
    // =========================================================================

    pub fn stats(&self) -> HostStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = HostStats::default();
    }

    /// Let `calls` more adapter calls succeed, then fail every call with
    /// [`HostError::Injected`] until [`clear_failure`](Self::clear_failure).
    /// `release` is never failed.
    pub fn fail_after(&mut self, calls: usize) {
        self.fail_budget = Some(calls);
    }

    pub fn clear_failure(&mut self) {
        self.fail_budget = None;
    }

    fn check(&mut self, op: &'static str) -> Result<(), HostError> {
        match self.fail_budget {
            Some(0) => {
                tracing::debug!(op, "injected host failure");
                Err(HostError::Injected { op })
            }
            Some(n) => {
                self.fail_budget = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }

    // =========================================================================
    // Arena
    // =========================================================================

    fn push(&mut self, kind: HostNodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(HostNode {
            kind,
            parent: None,
            children: Vec::new(),
            released: false,
        });
        id
    }

    fn live(&self, id: NodeId) -> Result<&HostNode, HostError> {
        match self.nodes.get(id.0) {
            Some(node) if !node.released => Ok(node),
            _ => Err(HostError::UnknownHandle {
                handle: id.to_string(),
            }),
        }
    }

    fn live_mut(&mut self, id: NodeId) -> Result<&mut HostNode, HostError> {
        match self.nodes.get_mut(id.0) {
            Some(node) if !node.released => Ok(node),
            _ => Err(HostError::UnknownHandle {
                handle: id.to_string(),
            }),
        }
    }

    fn attrs_mut(&mut self, id: NodeId) -> Result<&mut BTreeMap<String, AttrValue>, HostError> {
        match &mut self.live_mut(id)?.kind {
            HostNodeKind::Element { attrs, .. } => Ok(attrs),
            HostNodeKind::Text(_) => Err(HostError::other(format!("{id} is a text node"))),
        }
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.nodes[child.0].parent.take() else {
            return;
        };
        self.nodes[parent.0].children.retain(|&c| c != child);
    }
}

impl HostAdapter for MemoryHost {
    type Handle = NodeId;

    fn create_element(&mut self, tag: &str) -> Result<NodeId, HostError> {
        self.check("create_element")?;
        self.stats.created += 1;
        Ok(self.push(HostNodeKind::Element {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
        }))
    }

    fn create_text(&mut self, content: &str) -> Result<NodeId, HostError> {
        self.check("create_text")?;
        self.stats.created += 1;
        Ok(self.push(HostNodeKind::Text(content.to_string())))
    }

    fn set_attribute(&mut self, node: &NodeId, key: &str, value: &AttrValue) -> Result<(), HostError> {
        self.check("set_attribute")?;
        self.attrs_mut(*node)?.insert(key.to_string(), value.clone());
        self.stats.attribute_writes += 1;
        Ok(())
    }

    fn remove_attribute(&mut self, node: &NodeId, key: &str) -> Result<(), HostError> {
        self.check("remove_attribute")?;
        self.attrs_mut(*node)?.remove(key);
        self.stats.attribute_writes += 1;
        Ok(())
    }

    fn set_text(&mut self, node: &NodeId, content: &str) -> Result<(), HostError> {
        self.check("set_text")?;
        match &mut self.live_mut(*node)?.kind {
            HostNodeKind::Text(current) => *current = content.to_string(),
            HostNodeKind::Element { .. } => {
                return Err(HostError::other(format!("{node} is not a text node")));
            }
        }
        self.stats.text_writes += 1;
        Ok(())
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        self.insert_before(parent, child, None)
    }

    fn insert_before(
        &mut self,
        parent: &NodeId,
        child: &NodeId,
        anchor: Option<&NodeId>,
    ) -> Result<(), HostError> {
        self.check("insert_before")?;
        self.live(*parent)?;
        self.live(*child)?;
        if anchor == Some(child) {
            return Ok(());
        }
        if let Some(anchor) = anchor {
            if self.live(*anchor)?.parent != Some(*parent) {
                return Err(HostError::NotAChild {
                    parent: parent.to_string(),
                    child: anchor.to_string(),
                });
            }
        }

        self.detach(*child);
        let siblings = &mut self.nodes[parent.0].children;
        let position = anchor
            .and_then(|a| siblings.iter().position(|c| c == a))
            .unwrap_or(siblings.len());
        siblings.insert(position, *child);
        self.nodes[child.0].parent = Some(*parent);
        self.stats.inserts += 1;
        Ok(())
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        self.check("remove_child")?;
        self.live(*parent)?;
        if self.live(*child)?.parent != Some(*parent) {
            return Err(HostError::NotAChild {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }
        self.detach(*child);
        self.stats.removes += 1;
        Ok(())
    }

    fn release(&mut self, node: &NodeId) -> Result<(), HostError> {
        let entry = self.live_mut(*node)?;
        entry.released = true;
        if let HostNodeKind::Element { attrs, .. } = &mut entry.kind {
            attrs.retain(|_, value| !value.is_handler());
        }
        self.stats.released += 1;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn host_with_list() -> (MemoryHost, NodeId, Vec<NodeId>) {
        let mut host = MemoryHost::new();
        let root = host.create_root("ul");
        let items: Vec<NodeId> = ["a", "b", "c"]
            .iter()
            .map(|label| {
                let li = host.create_element("li").unwrap();
                let text = host.create_text(label).unwrap();
                host.append_child(&li, &text).unwrap();
                host.append_child(&root, &li).unwrap();
                li
            })
            .collect();
        (host, root, items)
    }

    #[test]
    fn test_markup() {
        let (mut host, root, items) = host_with_list();
        host.set_attribute(&items[0], "class", &"first".into()).unwrap();
        assert_eq!(
            host.to_markup(root),
            "<ul><li class=\"first\">a</li><li>b</li><li>c</li></ul>"
        );
        assert_eq!(host.text_content(root), "abc");
    }

    #[test]
    fn test_insert_before_moves_attached_child() {
        let (mut host, root, items) = host_with_list();
        host.insert_before(&root, &items[2], Some(&items[0])).unwrap();
        assert_eq!(host.children(root), &[items[2], items[0], items[1]]);

        host.insert_before(&root, &items[2], None).unwrap();
        assert_eq!(host.children(root), &[items[0], items[1], items[2]]);
    }

    #[test]
    fn test_remove_child_requires_parent() {
        let (mut host, root, items) = host_with_list();
        let orphan = host.create_element("li").unwrap();
        assert!(matches!(
            host.remove_child(&root, &orphan),
            Err(HostError::NotAChild { .. })
        ));

        host.remove_child(&root, &items[1]).unwrap();
        assert_eq!(host.children(root), &[items[0], items[2]]);
        assert_eq!(host.parent(items[1]), None);
    }

    #[test]
    fn test_released_handles_are_rejected() {
        let (mut host, _root, items) = host_with_list();
        host.set_attribute(&items[0], "onClick", &Handler::new(|| {}).into())
            .unwrap();
        host.release(&items[0]).unwrap();

        assert!(host.is_released(items[0]));
        assert!(host.handler(items[0], "onClick").is_none());
        assert!(matches!(
            host.set_attribute(&items[0], "id", &"x".into()),
            Err(HostError::UnknownHandle { .. })
        ));
    }

    #[test]
    fn test_fail_after() {
        let mut host = MemoryHost::new();
        host.fail_after(1);
        assert!(host.create_element("div").is_ok());
        assert_eq!(
            host.create_element("div"),
            Err(HostError::Injected { op: "create_element" })
        );
        assert!(host.create_text("x").is_err());

        host.clear_failure();
        assert!(host.create_text("x").is_ok());
        assert_eq!(host.stats().created, 2);
    }

    #[test]
    fn test_set_text_on_element_fails() {
        let (mut host, root, _) = host_with_list();
        assert!(host.set_text(&root, "x").is_err());
    }

    #[test]
    fn test_find_by_attribute() {
        let (mut host, root, items) = host_with_list();
        host.set_attribute(&items[1], "id", &"second".into()).unwrap();
        assert_eq!(host.find_by_attribute(root, "id", "second"), Some(items[1]));
        assert_eq!(host.find_by_attribute(root, "id", "missing"), None);
    }
}
