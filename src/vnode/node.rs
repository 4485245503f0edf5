//! Tree node types and builders.

use std::any::TypeId;
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::types::{AttrValue, Key, PatchFlags};

/// Attribute map of an element. Ordered so diffs are deterministic.
pub type Attributes = BTreeMap<String, AttrValue>;

/// Props handed to a component's render function.
pub type Props = BTreeMap<String, AttrValue>;

/// Render function of a component.
pub type RenderFn = Rc<dyn Fn(&Props) -> VNode>;

// =============================================================================
// VNode
// =============================================================================

/// One node of a tree description.
///
/// Descriptions are values: they are rebuilt on every render and never
/// mutated once handed to the reconciler. Host handles live in the
/// renderer's side table, not here.
#[derive(Debug, Clone, PartialEq)]
pub enum VNode {
    Text(TextNode),
    Element(ElementNode),
    Component(ComponentNode),
}

impl VNode {
    /// Key of this node, if any. Text nodes never carry one.
    pub fn key(&self) -> Option<&Key> {
        match self {
            VNode::Text(_) => None,
            VNode::Element(el) => el.key.as_ref(),
            VNode::Component(c) => c.key.as_ref(),
        }
    }

    pub fn flags(&self) -> PatchFlags {
        match self {
            VNode::Text(_) => PatchFlags::TEXT,
            VNode::Element(el) => el.flags,
            VNode::Component(_) => PatchFlags::COMPONENT,
        }
    }

    /// True if `self` and `other` can be patched into each other
    /// (same text-ness, same tag, same component type).
    pub fn same_kind(&self, other: &VNode) -> bool {
        match (self, other) {
            (VNode::Text(_), VNode::Text(_)) => true,
            (VNode::Element(a), VNode::Element(b)) => a.tag == b.tag,
            (VNode::Component(a), VNode::Component(b)) => a.same_type(b),
            _ => false,
        }
    }

    /// Same kind and same key. Two unkeyed nodes of the same kind match.
    pub fn same_node(&self, other: &VNode) -> bool {
        self.same_kind(other) && self.key() == other.key()
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            VNode::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            VNode::Text(t) => Some(&t.content),
            _ => None,
        }
    }

    /// Render every component in the tree now.
    ///
    /// Called inside a tracked computation this makes component reads part
    /// of that computation's dependencies.
    pub fn resolve(&self) {
        match self {
            VNode::Text(_) => {}
            VNode::Element(el) => el.children.iter().for_each(VNode::resolve),
            VNode::Component(c) => c.rendered().resolve(),
        }
    }

    /// Number of host nodes this description produces once mounted.
    pub fn host_size(&self) -> usize {
        match self {
            VNode::Text(_) => 1,
            VNode::Element(el) => 1 + el.children.iter().map(VNode::host_size).sum::<usize>(),
            VNode::Component(c) => c.rendered().host_size(),
        }
    }
}

impl From<TextNode> for VNode {
    fn from(node: TextNode) -> Self {
        VNode::Text(node)
    }
}

impl From<ElementNode> for VNode {
    fn from(node: ElementNode) -> Self {
        VNode::Element(node)
    }
}

impl From<ComponentNode> for VNode {
    fn from(node: ComponentNode) -> Self {
        VNode::Component(node)
    }
}

impl From<&str> for VNode {
    fn from(content: &str) -> Self {
        text(content)
    }
}

impl From<String> for VNode {
    fn from(content: String) -> Self {
        text(content)
    }
}

// =============================================================================
// Text
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    pub content: String,
}

/// Build a text node.
pub fn text(content: impl Into<String>) -> VNode {
    VNode::Text(TextNode {
        content: content.into(),
    })
}

// =============================================================================
// Element
// =============================================================================

/// An element with a tag, attributes and ordered children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementNode {
    pub tag: String,
    pub attrs: Attributes,
    pub children: Vec<VNode>,
    pub key: Option<Key>,
    pub flags: PatchFlags,
    /// Keys diffed when [`PatchFlags::PROPS`] narrows the attribute diff.
    pub dynamic_props: Vec<String>,
}

/// Start building an element.
///
/// ```
/// use spark_vdom::vnode::element;
///
/// let list = element("ul")
///     .keyed()
///     .child(element("li").key("a").child("Item A"))
///     .child(element("li").key("b").child("Item B"));
/// assert_eq!(list.children.len(), 2);
/// ```
pub fn element(tag: impl Into<String>) -> ElementNode {
    ElementNode {
        tag: tag.into(),
        ..Default::default()
    }
}

impl ElementNode {
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn flags(mut self, flags: PatchFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Mark children as keyed.
    pub fn keyed(self) -> Self {
        self.flags(PatchFlags::KEYED_CHILDREN)
    }

    /// Declare a dynamic prop and set [`PatchFlags::PROPS`].
    pub fn dynamic_prop(mut self, key: impl Into<String>) -> Self {
        self.dynamic_props.push(key.into());
        self.flags(PatchFlags::PROPS)
    }

    pub fn child(mut self, child: impl Into<VNode>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I, C>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<VNode>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Finish building.
    pub fn build(self) -> VNode {
        VNode::Element(self)
    }

    /// True if `key` takes part in this element's attribute diff.
    pub(crate) fn is_dynamic_attr(&self, key: &str) -> bool {
        if !self.flags.narrows_attributes() {
            return true;
        }
        (self.flags.contains(PatchFlags::CLASS) && key == "class")
            || (self.flags.contains(PatchFlags::STYLE) && key == "style")
            || (self.flags.contains(PatchFlags::PROPS) && self.dynamic_props.iter().any(|p| p == key))
    }
}

// =============================================================================
// Component
// =============================================================================

/// A component: a named render function plus its props.
///
/// Two components are the same type when they were built from the same
/// render function: the same `fn` item, or the same closure expression. The
/// name is only a label. The rendered output is computed on first use and
/// cached on the description, so an old tree is never rendered twice.
#[derive(Clone)]
pub struct ComponentNode {
    pub name: Rc<str>,
    pub props: Props,
    pub key: Option<Key>,
    render: RenderFn,
    render_type: TypeId,
    rendered: OnceCell<Box<VNode>>,
}

/// Build a component node.
pub fn component<F>(name: impl Into<Rc<str>>, render: F, props: Props) -> ComponentNode
where
    F: Fn(&Props) -> VNode + 'static,
{
    ComponentNode {
        name: name.into(),
        props,
        key: None,
        render: Rc::new(render),
        render_type: TypeId::of::<F>(),
        rendered: OnceCell::new(),
    }
}

impl ComponentNode {
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn prop(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.props.insert(key.into(), value.into());
        self.rendered = OnceCell::new();
        self
    }

    /// Same render function. Every call of a render helper that returns the
    /// same closure expression yields the same type.
    pub fn same_type(&self, other: &ComponentNode) -> bool {
        self.render_type == other.render_type
    }

    /// Rendered output, computed once.
    pub fn rendered(&self) -> &VNode {
        self.rendered.get_or_init(|| Box::new((self.render)(&self.props)))
    }
}

impl PartialEq for ComponentNode {
    fn eq(&self, other: &Self) -> bool {
        self.same_type(other)
            && self.name == other.name
            && self.key == other.key
            && self.props == other.props
    }
}

impl fmt::Debug for ComponentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentNode")
            .field("name", &self.name)
            .field("props", &self.props)
            .field("key", &self.key)
            .field("rendered", &self.rendered.get().is_some())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
