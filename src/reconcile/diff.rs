//! Tree diff - element, text and component pairs, attributes, positional
//! children.

use super::keyed::diff_keyed_children;
use super::script::{EditScript, PatchOp};
use crate::types::PatchFlags;
use crate::vnode::{ElementNode, VNode};

/// Compute the edit script turning `old` into `new`.
///
/// Pure and total: no host calls, no failure. Only a change of kind (text vs
/// element vs component), tag or component type forces a `Replace`.
///
/// ```
/// use spark_vdom::reconcile::{diff, EditScript, PatchOp};
/// use spark_vdom::vnode::text;
///
/// let script = diff(&text("Count: 0"), &text("Count: 1"));
/// assert_eq!(
///     script,
///     EditScript::Update(vec![PatchOp::UpdateText { value: "Count: 1".into() }])
/// );
/// ```
pub fn diff(old: &VNode, new: &VNode) -> EditScript {
    match (old, new) {
        (VNode::Text(a), VNode::Text(b)) => {
            if a.content == b.content {
                EditScript::noop()
            } else {
                EditScript::Update(vec![PatchOp::UpdateText {
                    value: b.content.clone(),
                }])
            }
        }
        (VNode::Element(a), VNode::Element(b)) if a.tag == b.tag => {
            EditScript::Update(diff_element(a, b))
        }
        (VNode::Component(a), VNode::Component(b)) if a.same_type(b) => {
            diff(a.rendered(), b.rendered())
        }
        _ => EditScript::Replace(new.clone()),
    }
}

fn diff_element(old: &ElementNode, new: &ElementNode) -> Vec<PatchOp> {
    let mut ops = Vec::new();

    if !new.flags.contains(PatchFlags::TEXT) {
        diff_attributes(old, new, &mut ops);
    }

    if new.flags.contains(PatchFlags::KEYED_CHILDREN) {
        diff_keyed_children(&old.children, &new.children, &mut ops);
    } else {
        diff_unkeyed_children(&old.children, &new.children, &mut ops);
    }

    ops
}

/// Sets and changes first, then removals, each group in key order.
fn diff_attributes(old: &ElementNode, new: &ElementNode, ops: &mut Vec<PatchOp>) {
    for (key, value) in &new.attrs {
        if !new.is_dynamic_attr(key) {
            continue;
        }
        if old.attrs.get(key) != Some(value) {
            ops.push(PatchOp::SetAttribute {
                key: key.clone(),
                value: value.clone(),
            });
        }
    }

    for key in old.attrs.keys() {
        if new.is_dynamic_attr(key) && !new.attrs.contains_key(key) {
            ops.push(PatchOp::RemoveAttribute { key: key.clone() });
        }
    }
}

fn diff_unkeyed_children(old: &[VNode], new: &[VNode], ops: &mut Vec<PatchOp>) {
    let common = old.len().min(new.len());

    for index in 0..common {
        patch_child(ops, index, &old[index], &new[index]);
    }

    for (index, node) in new.iter().enumerate().skip(common) {
        ops.push(PatchOp::AddChild {
            index,
            node: node.clone(),
        });
    }

    for index in common..old.len() {
        ops.push(PatchOp::RemoveChild { index });
    }
}

/// Push `PatchChild(index, diff(old, new))` unless it would do nothing.
pub(super) fn patch_child(ops: &mut Vec<PatchOp>, index: usize, old: &VNode, new: &VNode) {
    let script = diff(old, new);
    if !script.is_noop() {
        ops.push(PatchOp::PatchChild { index, script });
    }
}

// =============================================================================
// Tests
// =============================================================================
