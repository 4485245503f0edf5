//! Edit scripts - the output of [`diff`](super::diff).
//!
//! # Reference frame
//!
//! Child indices come from two lists:
//! - `RemoveChild.index`, `MoveChild.from` and `PatchChild.index` are
//!   positions in the OLD child list
//! - `AddChild.index` and `MoveChild.to` are positions in the NEW child list
//!
//! Ops never shift each other's indices; the applier resolves them all
//! against a snapshot of the old children.

use crate::types::AttrValue;
use crate::vnode::VNode;

/// What to do with one node.
#[derive(Debug, Clone, PartialEq)]
pub enum EditScript {
    /// Tear down the old subtree and mount this one in its place.
    Replace(VNode),
    /// Patch the existing node in place.
    Update(Vec<PatchOp>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatchOp {
    SetAttribute { key: String, value: AttrValue },
    RemoveAttribute { key: String },
    AddChild { index: usize, node: VNode },
    RemoveChild { index: usize },
    MoveChild { from: usize, to: usize },
    PatchChild { index: usize, script: EditScript },
    UpdateText { value: String },
}

impl PatchOp {
    pub fn name(&self) -> &'static str {
        match self {
            PatchOp::SetAttribute { .. } => "set_attribute",
            PatchOp::RemoveAttribute { .. } => "remove_attribute",
            PatchOp::AddChild { .. } => "add_child",
            PatchOp::RemoveChild { .. } => "remove_child",
            PatchOp::MoveChild { .. } => "move_child",
            PatchOp::PatchChild { .. } => "patch_child",
            PatchOp::UpdateText { .. } => "update_text",
        }
    }
}

impl EditScript {
    /// The empty update.
    pub fn noop() -> Self {
        EditScript::Update(Vec::new())
    }

    /// True if applying this script changes nothing.
    pub fn is_noop(&self) -> bool {
        matches!(self, EditScript::Update(ops) if ops.is_empty())
    }

    pub fn is_replace(&self) -> bool {
        matches!(self, EditScript::Replace(_))
    }

    /// Ops of an update, empty for a replace.
    pub fn ops(&self) -> &[PatchOp] {
        match self {
            EditScript::Update(ops) => ops,
            EditScript::Replace(_) => &[],
        }
    }

    /// Op counts over the whole script, nested scripts included.
    pub fn stats(&self) -> DiffStats {
        let mut stats = DiffStats::default();
        stats.collect(self);
        stats
    }
}

// =============================================================================
// Stats
// =============================================================================

/// Op counts of an edit script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub replaced: usize,
    pub attributes_set: usize,
    pub attributes_removed: usize,
    pub added: usize,
    pub removed: usize,
    pub moved: usize,
    pub patched: usize,
    pub text_updates: usize,
}

impl DiffStats {
    fn collect(&mut self, script: &EditScript) {
        let ops = match script {
            EditScript::Replace(_) => {
                self.replaced += 1;
                return;
            }
            EditScript::Update(ops) => ops,
        };
        for op in ops {
            match op {
                PatchOp::SetAttribute { .. } => self.attributes_set += 1,
                PatchOp::RemoveAttribute { .. } => self.attributes_removed += 1,
                PatchOp::AddChild { .. } => self.added += 1,
                PatchOp::RemoveChild { .. } => self.removed += 1,
                PatchOp::MoveChild { .. } => self.moved += 1,
                PatchOp::UpdateText { .. } => self.text_updates += 1,
                PatchOp::PatchChild { script, .. } => {
                    self.patched += 1;
                    self.collect(script);
                }
            }
        }
    }

    /// Ops that touch child structure (add, remove, move, replace).
    pub fn structural(&self) -> usize {
        self.added + self.removed + self.moved + self.replaced
    }
}
