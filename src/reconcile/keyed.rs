//! Keyed children diff.
//!
//! # Algorithm
//!
//! 1. Common prefix: patch pairs that are the same node, left to right.
//! 2. Common suffix: same, right to left.
//! 3. If only additions or only removals are left, emit them and stop.
//! 4. Middle: map new keys to new positions, match old children by key,
//!    remove the unmatched, then keep the longest run of matches already in
//!    increasing old order and move the rest. Unmatched new children are
//!    added.
//!
//! Duplicate keys: the first occurrence wins on both sides. A later old
//! duplicate is removed, a later new duplicate is added fresh. Unkeyed
//! children in the middle window never match.

use std::collections::HashMap;

use super::diff::patch_child;
use super::lis::longest_increasing_subsequence;
use super::script::PatchOp;
use crate::types::Key;
use crate::vnode::VNode;

pub(super) fn diff_keyed_children(old: &[VNode], new: &[VNode], ops: &mut Vec<PatchOp>) {
    let mut start = 0;
    while start < old.len() && start < new.len() && old[start].same_node(&new[start]) {
        patch_child(ops, start, &old[start], &new[start]);
        start += 1;
    }

    // exclusive ends
    let mut old_end = old.len();
    let mut new_end = new.len();
    while old_end > start && new_end > start && old[old_end - 1].same_node(&new[new_end - 1]) {
        patch_child(ops, old_end - 1, &old[old_end - 1], &new[new_end - 1]);
        old_end -= 1;
        new_end -= 1;
    }

    if start == old_end {
        for (index, node) in new.iter().enumerate().take(new_end).skip(start) {
            ops.push(PatchOp::AddChild {
                index,
                node: node.clone(),
            });
        }
        return;
    }

    if start == new_end {
        for index in start..old_end {
            ops.push(PatchOp::RemoveChild { index });
        }
        return;
    }

    diff_middle(old, new, start, old_end, new_end, ops);
}

fn diff_middle(
    old: &[VNode],
    new: &[VNode],
    start: usize,
    old_end: usize,
    new_end: usize,
    ops: &mut Vec<PatchOp>,
) {
    let mut new_positions: HashMap<&Key, usize> = HashMap::new();
    for (index, node) in new.iter().enumerate().take(new_end).skip(start) {
        if let Some(key) = node.key() {
            if new_positions.contains_key(key) {
                tracing::debug!(%key, index, "duplicate key in new children");
            } else {
                new_positions.insert(key, index);
            }
        }
    }

    // slots[j] = old index matched to new[start + j]
    let mut slots: Vec<Option<usize>> = vec![None; new_end - start];

    for (old_index, old_node) in old.iter().enumerate().take(old_end).skip(start) {
        let matched = old_node
            .key()
            .and_then(|key| new_positions.get(key).copied())
            .filter(|&new_index| slots[new_index - start].is_none())
            .filter(|&new_index| old_node.same_kind(&new[new_index]));

        match matched {
            Some(new_index) => {
                slots[new_index - start] = Some(old_index);
                patch_child(ops, old_index, old_node, &new[new_index]);
            }
            None => ops.push(PatchOp::RemoveChild { index: old_index }),
        }
    }

    let stable = longest_increasing_subsequence(&slots);
    let mut stable = stable.into_iter().peekable();

    for (offset, slot) in slots.iter().enumerate() {
        let index = start + offset;
        match slot {
            None => ops.push(PatchOp::AddChild {
                index,
                node: new[index].clone(),
            }),
            Some(from) => {
                if stable.peek() == Some(&offset) {
                    stable.next();
                } else {
                    ops.push(PatchOp::MoveChild {
                        from: *from,
                        to: index,
                    });
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::reconcile::{diff, EditScript, PatchOp};
    use crate::vnode::{element, text, VNode};

    fn item(key: &str) -> VNode {
        element("li").key(key).child(format!("Item {key}")).build()
    }

    fn list(keys: &[&str]) -> VNode {
        element("ul").keyed().children(keys.iter().map(|k| item(k))).build()
    }

    fn ops(old: &[&str], new: &[&str]) -> Vec<PatchOp> {
        diff(&list(old), &list(new)).ops().to_vec()
    }

    #[test]
    fn test_append_adds_only() {
        assert_eq!(
            ops(&["a", "b", "c"], &["a", "b", "c", "d"]),
            vec![PatchOp::AddChild { index: 3, node: item("d") }]
        );
    }

    #[test]
    fn test_prepend_adds_only() {
        assert_eq!(
            ops(&["a", "b"], &["z", "a", "b"]),
            vec![PatchOp::AddChild { index: 0, node: item("z") }]
        );
    }

    #[test]
    fn test_remove_from_middle() {
        assert_eq!(
            ops(&["a", "b", "c"], &["a", "c"]),
            vec![PatchOp::RemoveChild { index: 1 }]
        );
    }

    #[test]
    fn test_mixed_without_moves() {
        assert_eq!(
            ops(&["a", "b", "c"], &["d", "a", "c", "e"]),
            vec![
                PatchOp::RemoveChild { index: 1 },
                PatchOp::AddChild { index: 0, node: item("d") },
                PatchOp::AddChild { index: 3, node: item("e") },
            ]
        );
    }

    #[test]
    fn test_swap_moves_one() {
        let script = ops(&["a", "b", "c", "d"], &["a", "c", "b", "d"]);
        assert_eq!(script.len(), 1);
        assert!(matches!(script[0], PatchOp::MoveChild { .. }));
    }

    #[test]
    fn test_reverse_moves_all_but_one() {
        let script = ops(&["a", "b", "c", "d"], &["d", "c", "b", "a"]);
        let moves = script
            .iter()
            .filter(|op| matches!(op, PatchOp::MoveChild { .. }))
            .count();
        assert_eq!(moves, 3);
        assert_eq!(script.len(), 3);
    }

    #[test]
    fn test_matched_children_are_patched_by_old_index() {
        let old = list(&["a", "b", "c"]);
        let new = element("ul")
            .keyed()
            .child(item("c"))
            .child(item("a"))
            .child(element("li").key("b").child("changed"))
            .build();

        let script = diff(&old, &new);
        let patched: Vec<usize> = script
            .ops()
            .iter()
            .filter_map(|op| match op {
                PatchOp::PatchChild { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(patched, vec![1]);
        assert_eq!(script.stats().moved, 1);
    }

    #[test]
    fn test_same_key_different_tag_is_replaced_by_add() {
        let old = element("ul").keyed().child(item("x")).child(item("a")).build();
        let new = element("ul")
            .keyed()
            .child(item("a"))
            .child(element("p").key("x").build())
            .build();

        let stats = diff(&old, &new).stats();
        assert_eq!(stats.removed, 1);
        assert_eq!(stats.added, 1);
    }

    #[test]
    fn test_duplicate_keys_first_wins() {
        let old = list(&["a", "a", "b"]);
        let new = list(&["b", "a", "a"]);

        let stats = diff(&old, &new).stats();
        // one old "a" matches, the other is removed; one new "a" is added
        assert_eq!(stats.removed, 1);
        assert_eq!(stats.added, 1);
    }

    #[test]
    fn test_unkeyed_children_in_keyed_list() {
        let old = element("ul").keyed().child(text("x")).child(item("a")).build();
        let new = element("ul").keyed().child(item("a")).child(text("x")).build();

        let script = diff(&old, &new);
        assert!(!script.is_replace());
        assert_ne!(script, EditScript::noop());
    }
}
