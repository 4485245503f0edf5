//! Applying edit scripts to the host.
//!
//! # Child ops
//!
//! Child indices are resolved against a snapshot of the children as they
//! were before the script (see [`crate::reconcile::EditScript`]):
//!
//! 1. `RemoveChild` detaches at once; `PatchChild` recurses at once
//! 2. `AddChild` builds a detached subtree, `MoveChild` takes the child out
//!    of the snapshot; both are parked at their target position
//! 3. When the ops are done, the final list is the parked children at their
//!    positions with the untouched survivors filling the gaps in their old
//!    order
//! 4. Right to left, every parked child is inserted before its right
//!    neighbour. Survivors never move.
//!
//! # Failure
//!
//! The first host error stops the script. Detached new subtrees are
//! released; every node still attached stays in the mirror, in unspecified
//! order. The host tree may be half patched, so callers should remount.
//!
//! A replace whose old root cannot be detached takes the new root back out.
//! If the host refuses that too, the new root is kept in
//! [`Mounted::displaced`] for teardown.

use std::collections::BTreeMap;
use std::mem;

use super::mount::{create_tree, detach, release_quietly, release_subtree};
use super::Mounted;
use crate::error::{RenderError, Result};
use crate::host::HostAdapter;
use crate::reconcile::{EditScript, PatchOp};
use crate::vnode::VNode;

/// Apply `script` to the host node behind `mounted`, a child of `parent`.
///
/// `mounted` is kept in step with the host: after success it mirrors the
/// new description. After a failure it still owns every attached node but
/// not in host order, so it is only good for teardown.
pub fn apply<A: HostAdapter>(
    host: &mut A,
    parent: &A::Handle,
    mounted: &mut Mounted<A::Handle>,
    script: &EditScript,
) -> Result<()> {
    match script {
        EditScript::Replace(node) => replace(host, parent, mounted, node),
        EditScript::Update(ops) => apply_ops(host, mounted, ops),
    }
}

fn replace<A: HostAdapter>(
    host: &mut A,
    parent: &A::Handle,
    mounted: &mut Mounted<A::Handle>,
    node: &VNode,
) -> Result<()> {
    let fresh = create_tree(host, node)?;
    if let Err(err) = host.insert_before(parent, &fresh.handle, Some(&mounted.handle)) {
        release_quietly(host, &fresh);
        return Err(err.into());
    }

    if let Err(err) = detach(host, parent, mounted) {
        match host.remove_child(parent, &fresh.handle) {
            Ok(()) => release_quietly(host, &fresh),
            Err(undo) => {
                tracing::warn!(error = %undo, "could not roll back replace");
                mounted.displaced.push(fresh);
            }
        }
        return Err(err.into());
    }

    let old = mem::replace(mounted, fresh);
    release_subtree(host, &old)?;
    Ok(())
}

fn apply_ops<A: HostAdapter>(
    host: &mut A,
    mounted: &mut Mounted<A::Handle>,
    ops: &[PatchOp],
) -> Result<()> {
    let parent = mounted.handle.clone();
    let mut edit = ChildEdit::new(mem::take(&mut mounted.children));

    for op in ops {
        tracing::trace!(op = op.name(), "apply");
        if let Err(err) = apply_op(host, &parent, &mut edit, op) {
            mounted.children = edit.abandon(host);
            return Err(err);
        }
    }

    let (children, result) = edit.finish(host, &parent);
    mounted.children = children;
    result
}

fn apply_op<A: HostAdapter>(
    host: &mut A,
    target: &A::Handle,
    edit: &mut ChildEdit<A::Handle>,
    op: &PatchOp,
) -> Result<()> {
    match op {
        PatchOp::SetAttribute { key, value } => host.set_attribute(target, key, value)?,
        PatchOp::RemoveAttribute { key } => host.remove_attribute(target, key)?,
        PatchOp::UpdateText { value } => host.set_text(target, value)?,
        PatchOp::PatchChild { index, script } => {
            let child = edit.get_mut(*index)?;
            apply(host, target, child, script)?;
        }
        PatchOp::RemoveChild { index } => {
            let child = edit.take(*index)?;
            if let Err(err) = detach(host, target, &child) {
                edit.put_back(*index, child);
                return Err(err.into());
            }
            release_subtree(host, &child)?;
        }
        PatchOp::AddChild { index, node } => {
            edit.check_free(*index)?;
            let fresh = create_tree(host, node)?;
            edit.park(*index, fresh, false);
        }
        PatchOp::MoveChild { from, to } => {
            edit.check_free(*to)?;
            let child = edit.take(*from)?;
            edit.slots[*from] = Slot::Moved(*to);
            edit.park(*to, child, true);
        }
    }
    Ok(())
}

// =============================================================================
// Child bookkeeping
// =============================================================================

enum Slot<H> {
    Present(Mounted<H>),
    /// Parked at this new index.
    Moved(usize),
    Removed,
}

struct Parked<H> {
    mounted: Mounted<H>,
    attached: bool,
}

struct ChildEdit<H> {
    slots: Vec<Slot<H>>,
    parked: BTreeMap<usize, Parked<H>>,
}

impl<H: Clone> ChildEdit<H> {
    fn new(children: Vec<Mounted<H>>) -> Self {
        Self {
            slots: children.into_iter().map(Slot::Present).collect(),
            parked: BTreeMap::new(),
        }
    }

    /// Child at old position `index`, wherever it is parked now.
    fn get_mut(&mut self, index: usize) -> Result<&mut Mounted<H>> {
        match self.slots.get_mut(index) {
            Some(Slot::Present(mounted)) => Ok(mounted),
            Some(Slot::Moved(to)) => {
                let to = *to;
                self.parked
                    .get_mut(&to)
                    .map(|parked| &mut parked.mounted)
                    .ok_or(RenderError::ScriptMismatch { index })
            }
            _ => Err(RenderError::ScriptMismatch { index }),
        }
    }

    fn take(&mut self, index: usize) -> Result<Mounted<H>> {
        let Some(slot) = self.slots.get_mut(index) else {
            return Err(RenderError::ScriptMismatch { index });
        };
        match mem::replace(slot, Slot::Removed) {
            Slot::Present(mounted) => Ok(mounted),
            other => {
                *slot = other;
                Err(RenderError::ScriptMismatch { index })
            }
        }
    }

    fn put_back(&mut self, index: usize, mounted: Mounted<H>) {
        self.slots[index] = Slot::Present(mounted);
    }

    fn check_free(&self, index: usize) -> Result<()> {
        if self.parked.contains_key(&index) {
            return Err(RenderError::ScriptMismatch { index });
        }
        Ok(())
    }

    fn park(&mut self, index: usize, mounted: Mounted<H>, attached: bool) {
        self.parked.insert(index, Parked { mounted, attached });
    }

    /// Lay out the final child list and reposition parked children.
    fn finish<A>(self, host: &mut A, parent: &H) -> (Vec<Mounted<H>>, Result<()>)
    where
        A: HostAdapter<Handle = H>,
    {
        let survivors: Vec<Mounted<H>> = self
            .slots
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Present(mounted) => Some(mounted),
                _ => None,
            })
            .collect();
        let total = survivors.len() + self.parked.len();
        let mut parked = self.parked;

        let mut entries: Vec<(Parked<H>, bool)> = Vec::with_capacity(total);
        let mut survivors = survivors.into_iter();
        let mut result = Ok(());
        for index in 0..total {
            if let Some(entry) = parked.remove(&index) {
                entries.push((entry, true));
            } else if let Some(mounted) = survivors.next() {
                entries.push((Parked { mounted, attached: true }, false));
            }
        }
        // parked beyond the end: the script does not fit this parent
        if let Some((&index, _)) = parked.iter().next() {
            result = Err(RenderError::ScriptMismatch { index });
        }
        entries.extend(survivors.map(|mounted| (Parked { mounted, attached: true }, false)));
        entries.extend(parked.into_values().map(|entry| (entry, false)));

        if result.is_ok() {
            let mut anchor: Option<H> = None;
            for (entry, reposition) in entries.iter_mut().rev() {
                if *reposition {
                    if let Err(err) = host.insert_before(parent, &entry.mounted.handle, anchor.as_ref()) {
                        result = Err(err.into());
                        break;
                    }
                    entry.attached = true;
                }
                anchor = Some(entry.mounted.handle.clone());
            }
        }

        let children = keep_attached(host, entries.into_iter().map(|(entry, _)| entry));
        (children, result)
    }

    /// Mirror of whatever is still attached after a failed op.
    fn abandon<A>(self, host: &mut A) -> Vec<Mounted<H>>
    where
        A: HostAdapter<Handle = H>,
    {
        let present = self.slots.into_iter().filter_map(|slot| match slot {
            Slot::Present(mounted) => Some(Parked { mounted, attached: true }),
            _ => None,
        });
        let entries: Vec<Parked<H>> = present.chain(self.parked.into_values()).collect();
        keep_attached(host, entries)
    }
}

fn keep_attached<A, I>(host: &mut A, entries: I) -> Vec<Mounted<A::Handle>>
where
    A: HostAdapter,
    I: IntoIterator<Item = Parked<A::Handle>>,
{
    let mut children = Vec::new();
    for entry in entries {
        if entry.attached {
            children.push(entry.mounted);
        } else {
            release_quietly(host, &entry.mounted);
        }
    }
    children
}

// =============================================================================
// Tests
// =============================================================================
