//! Property-based invariant tests for diff + apply.
//!
//! For any pair of trees:
//!
//! 1. `diff(t, t)` is a no-op.
//! 2. Mounting `a` and applying `diff(a, b)` yields the same host tree as
//!    mounting `b`.
//! 3. Applying the attribute ops to `a`'s attributes yields `b`'s.
//! 4. Keyed lists move exactly `matched - LIS` children.
//! 5. Keyed children present on both sides keep their host node.
//! 6. `longest_increasing_subsequence` is increasing and as long as the
//!    quadratic reference.

use std::collections::{BTreeMap, HashMap};

use proptest::prelude::*;
use spark_vdom::host::{MemoryHost, NodeId};
use spark_vdom::reconcile::{diff, longest_increasing_subsequence, PatchOp};
use spark_vdom::renderer::{apply, mount};
use spark_vdom::types::AttrValue;
use spark_vdom::vnode::{element, text, VNode};

// ── Helpers ─────────────────────────────────────────────────────────────

fn attrs() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map(
        prop::sample::select(vec!["id", "class", "title", "style"]).prop_map(String::from),
        prop::sample::select(vec!["x", "y", "z"]).prop_map(String::from),
        0..3,
    )
}

fn tag() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["div", "span", "p"])
}

fn build(tag: &str, attrs: BTreeMap<String, String>, children: Vec<VNode>) -> VNode {
    let mut el = element(tag).children(children);
    for (key, value) in attrs {
        el = el.attr(key, value);
    }
    el.build()
}

/// Unkeyed trees a few levels deep.
fn tree() -> impl Strategy<Value = VNode> {
    let leaf = prop_oneof![
        "[a-c]{0,3}".prop_map(|s| text(s)),
        (tag(), attrs()).prop_map(|(t, a)| build(t, a, Vec::new())),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        (tag(), attrs(), prop::collection::vec(inner, 0..4))
            .prop_map(|(t, a, children)| build(t, a, children))
    })
}

/// Distinct keys in random order, each with a content version.
fn keyed_items() -> impl Strategy<Value = Vec<(u8, u8)>> {
    prop::collection::btree_map(0u8..24, 0u8..3, 0..12)
        .prop_map(|m| m.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

fn keyed_list(items: &[(u8, u8)]) -> VNode {
    element("ul")
        .keyed()
        .children(items.iter().map(|&(key, version)| {
            element("li")
                .key(key as i64)
                .attr("data-v", version as i64)
                .child(format!("item {key}"))
        }))
        .build()
}

fn mounted_markup(tree: &VNode) -> String {
    let mut host = MemoryHost::new();
    let root = host.create_root("root");
    mount(&mut host, tree, &root).unwrap();
    host.inner_markup(root)
}

/// Mount `a`, apply `diff(a, b)`, return the host and its root.
fn patched(a: &VNode, b: &VNode) -> (MemoryHost, NodeId) {
    let mut host = MemoryHost::new();
    let root = host.create_root("root");
    let mut mounted = mount(&mut host, a, &root).unwrap();
    let script = diff(a, b);
    apply(&mut host, &root, &mut mounted, &script).unwrap();
    (host, root)
}

fn lis_len_quadratic(seq: &[usize]) -> usize {
    let mut best = vec![1usize; seq.len()];
    for i in 0..seq.len() {
        for j in 0..i {
            if seq[j] < seq[i] {
                best[i] = best[i].max(best[j] + 1);
            }
        }
    }
    best.into_iter().max().unwrap_or(0)
}

// ═════════════════════════════════════════════════════════════════════════
// 1-2. Idempotence and patch correctness
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn identical_trees_produce_noop(t in tree()) {
        prop_assert!(diff(&t, &t).is_noop());
    }

    #[test]
    fn patching_matches_fresh_mount(a in tree(), b in tree()) {
        let (host, root) = patched(&a, &b);
        prop_assert_eq!(host.inner_markup(root), mounted_markup(&b));
    }

    #[test]
    fn patching_keyed_lists_matches_fresh_mount(old in keyed_items(), new in keyed_items()) {
        let (a, b) = (keyed_list(&old), keyed_list(&new));
        let (host, root) = patched(&a, &b);
        prop_assert_eq!(host.inner_markup(root), mounted_markup(&b));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Attribute diff completeness
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn attribute_ops_reproduce_target(a in attrs(), b in attrs()) {
        let old = build("div", a.clone(), Vec::new());
        let new = build("div", b.clone(), Vec::new());

        let mut result: BTreeMap<String, AttrValue> =
            a.into_iter().map(|(k, v)| (k, AttrValue::from(v))).collect();
        for op in diff(&old, &new).ops() {
            match op {
                PatchOp::SetAttribute { key, value } => {
                    result.insert(key.clone(), value.clone());
                }
                PatchOp::RemoveAttribute { key } => {
                    prop_assert!(result.remove(key).is_some(), "removed absent key {}", key);
                }
                other => prop_assert!(false, "unexpected op {:?}", other),
            }
        }

        let expected: BTreeMap<String, AttrValue> =
            b.into_iter().map(|(k, v)| (k, AttrValue::from(v))).collect();
        prop_assert_eq!(result, expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4-5. Keyed minimality and identity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn keyed_moves_are_minimal(old in keyed_items(), new in keyed_items()) {
        let old_pos: HashMap<u8, usize> =
            old.iter().enumerate().map(|(i, &(k, _))| (k, i)).collect();
        let matched: Vec<usize> = new.iter().filter_map(|(k, _)| old_pos.get(k).copied()).collect();
        let expected = matched.len() - lis_len_quadratic(&matched);

        let stats = diff(&keyed_list(&old), &keyed_list(&new)).stats();
        prop_assert_eq!(stats.moved, expected);
        prop_assert_eq!(stats.removed, old.len() - matched.len());
        prop_assert_eq!(stats.added, new.len() - matched.len());
    }

    #[test]
    fn same_order_never_moves(items in keyed_items(), drop_mask in prop::collection::vec(any::<bool>(), 12)) {
        let kept: Vec<(u8, u8)> = items
            .iter()
            .zip(drop_mask.iter().chain(std::iter::repeat(&false)))
            .filter(|(_, drop)| !**drop)
            .map(|(item, _)| *item)
            .collect();
        let stats = diff(&keyed_list(&items), &keyed_list(&kept)).stats();
        prop_assert_eq!(stats.moved, 0);
    }

    #[test]
    fn keyed_survivors_keep_host_nodes(old in keyed_items(), new in keyed_items()) {
        let (a, b) = (keyed_list(&old), keyed_list(&new));

        let mut host = MemoryHost::new();
        let root = host.create_root("root");
        let mut mounted = mount(&mut host, &a, &root).unwrap();
        let before: HashMap<u8, NodeId> = old
            .iter()
            .map(|&(k, _)| k)
            .zip(host.children(mounted.handle).iter().copied())
            .collect();

        apply(&mut host, &root, &mut mounted, &diff(&a, &b)).unwrap();

        let after: Vec<NodeId> = host.children(mounted.handle).to_vec();
        prop_assert_eq!(after.len(), new.len());
        for (&(key, _), id) in new.iter().zip(after) {
            if let Some(&original) = before.get(&key) {
                prop_assert_eq!(original, id, "key {} was recreated", key);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. LIS
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn lis_is_increasing_and_longest(seq in prop::collection::vec(prop::option::of(0usize..40), 0..30)) {
        let run = longest_increasing_subsequence(&seq);

        let values: Vec<usize> = run.iter().map(|&p| seq[p].unwrap()).collect();
        prop_assert!(run.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(values.windows(2).all(|w| w[0] < w[1]));

        let present: Vec<usize> = seq.iter().flatten().copied().collect();
        prop_assert_eq!(run.len(), lis_len_quadratic(&present));
    }
}
