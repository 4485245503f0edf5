//! Creating and tearing down host subtrees.

use super::Mounted;
use crate::error::{HostError, Result};
use crate::host::HostAdapter;
use crate::vnode::{ElementNode, VNode};

/// Mount `node` as the last child of `parent`.
///
/// On failure nothing stays attached and every node created so far is
/// released.
pub fn mount<A: HostAdapter>(
    host: &mut A,
    node: &VNode,
    parent: &A::Handle,
) -> Result<Mounted<A::Handle>> {
    let mounted = create_tree(host, node)?;
    if let Err(err) = host.append_child(parent, &mounted.handle) {
        release_quietly(host, &mounted);
        return Err(err.into());
    }
    tracing::debug!(nodes = mounted.len(), "mounted tree");
    Ok(mounted)
}

/// Detach `mounted` from `parent` and release the whole subtree.
pub fn unmount<A: HostAdapter>(
    host: &mut A,
    parent: &A::Handle,
    mounted: &Mounted<A::Handle>,
) -> Result<()> {
    detach(host, parent, mounted)?;
    release_subtree(host, mounted)?;
    tracing::debug!(nodes = mounted.len(), "unmounted tree");
    Ok(())
}

/// Build a detached host subtree for `node`.
///
/// Attributes are set and children appended before the subtree is
/// returned; the caller attaches it. Components contribute their rendered
/// output.
pub fn create_tree<A: HostAdapter>(host: &mut A, node: &VNode) -> Result<Mounted<A::Handle>> {
    match node {
        VNode::Text(text) => Ok(Mounted::leaf(host.create_text(&text.content)?)),
        VNode::Component(component) => create_tree(host, component.rendered()),
        VNode::Element(element) => {
            let mut mounted = Mounted::leaf(host.create_element(&element.tag)?);
            if let Err(err) = fill_element(host, element, &mut mounted) {
                release_quietly(host, &mounted);
                return Err(err);
            }
            Ok(mounted)
        }
    }
}

fn fill_element<A: HostAdapter>(
    host: &mut A,
    element: &ElementNode,
    mounted: &mut Mounted<A::Handle>,
) -> Result<()> {
    for (key, value) in &element.attrs {
        host.set_attribute(&mounted.handle, key, value)?;
    }
    for child in &element.children {
        let child = create_tree(host, child)?;
        if let Err(err) = host.append_child(&mounted.handle, &child.handle) {
            release_quietly(host, &child);
            return Err(err.into());
        }
        mounted.children.push(child);
    }
    Ok(())
}

/// Remove `mounted` and its displaced siblings from `parent`.
///
/// Keeps going after a failure and returns the first one.
pub(crate) fn detach<A: HostAdapter>(
    host: &mut A,
    parent: &A::Handle,
    mounted: &Mounted<A::Handle>,
) -> std::result::Result<(), HostError> {
    let mut first_error = None;
    for stale in &mounted.displaced {
        if let Err(err) = host.remove_child(parent, &stale.handle) {
            first_error.get_or_insert(err);
        }
    }
    if let Err(err) = host.remove_child(parent, &mounted.handle) {
        first_error.get_or_insert(err);
    }
    first_error.map_or(Ok(()), Err)
}

/// Release every node of `mounted`, children before parents.
///
/// Keeps going after a failure and returns the first one.
pub(crate) fn release_subtree<A: HostAdapter>(
    host: &mut A,
    mounted: &Mounted<A::Handle>,
) -> std::result::Result<(), HostError> {
    let mut first_error = None;
    for child in mounted.children.iter().chain(&mounted.displaced) {
        if let Err(err) = release_subtree(host, child) {
            first_error.get_or_insert(err);
        }
    }
    if let Err(err) = host.release(&mounted.handle) {
        first_error.get_or_insert(err);
    }
    first_error.map_or(Ok(()), Err)
}

/// Release on a path that is already failing.
pub(crate) fn release_quietly<A: HostAdapter>(host: &mut A, mounted: &Mounted<A::Handle>) {
    if let Err(err) = release_subtree(host, mounted) {
        tracing::warn!(error = %err, "release failed during cleanup");
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::types::Handler;
    use crate::vnode::{component, element, text, Props};

    fn sample() -> VNode {
        element("div")
            .attr("class", "container")
            .child(element("h1").child("Hello"))
            .child(
                element("ul")
                    .keyed()
                    .child(element("li").key("a").child("Item A"))
                    .child(element("li").key("b").child("Item B")),
            )
            .build()
    }

    #[test]
    fn test_mount_builds_host_tree() {
        let mut host = MemoryHost::new();
        let root = host.create_root("root");
        let mounted = mount(&mut host, &sample(), &root).unwrap();

        assert_eq!(
            host.inner_markup(root),
            "<div class=\"container\"><h1>Hello</h1><ul><li>Item A</li><li>Item B</li></ul></div>"
        );
        assert_eq!(mounted.len(), 7);
        assert_eq!(host.stats().created, 7);
    }

    #[test]
    fn test_handlers_are_bound() {
        let clicks = std::rc::Rc::new(std::cell::Cell::new(0));
        let counter = clicks.clone();
        let tree = element("button")
            .attr("onClick", Handler::new(move || counter.set(counter.get() + 1)))
            .child("Go")
            .build();

        let mut host = MemoryHost::new();
        let root = host.create_root("root");
        let mounted = mount(&mut host, &tree, &root).unwrap();

        host.handler(mounted.handle, "onClick").unwrap().call();
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn test_component_is_transparent() {
        let tree: VNode = component(
            "Greeting",
            |props| {
                let name = props.get("name").map(|v| v.to_string()).unwrap_or_default();
                element("p").child(format!("Hi {name}")).build()
            },
            Props::new(),
        )
        .prop("name", "Ada")
        .into();

        let mut host = MemoryHost::new();
        let root = host.create_root("root");
        mount(&mut host, &tree, &root).unwrap();
        assert_eq!(host.inner_markup(root), "<p>Hi Ada</p>");
    }

    #[test]
    fn test_failed_mount_releases_partial_tree() {
        let mut host = MemoryHost::new();
        let root = host.create_root("root");
        host.fail_after(4);

        let err = mount(&mut host, &sample(), &root).unwrap_err();
        assert!(err.is_host_failure());
        assert!(host.children(root).is_empty());
        // only the root survives
        assert_eq!(host.live_count(), 1);
    }

    #[test]
    fn test_unmount_releases_everything() {
        let mut host = MemoryHost::new();
        let root = host.create_root("root");
        let mounted = mount(&mut host, &sample(), &root).unwrap();

        unmount(&mut host, &root, &mounted).unwrap();
        assert!(host.children(root).is_empty());
        assert_eq!(host.stats().released, 7);
        assert!(mounted.handles().iter().all(|&&id| host.is_released(id)));
    }

    #[test]
    fn test_text_root() {
        let mut host = MemoryHost::new();
        let root = host.create_root("root");
        let mounted = mount(&mut host, &text("plain"), &root).unwrap();
        assert_eq!(host.text(mounted.handle), Some("plain"));
    }
}
