//! Reactive runtime - dependency graph and the active-computation stack.
//!
//! One runtime per thread. It owns:
//! - the dependency graph `subject -> field -> subscribers`
//! - the reverse index `effect -> {(subject, field)}` used to drop stale
//!   subscriptions before an effect re-runs
//! - the stack of running computations (top = the one tracked reads land on)
//! - ownership links from an effect to the effects created while it ran

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use crate::types::Field;

// =============================================================================
// Ids
// =============================================================================

/// Identity of a reactive record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectId(u64);

/// Identity of an effect. Ordered by creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(u64);

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

type EffectFn = Rc<RefCell<Box<dyn FnMut()>>>;

struct EffectEntry {
    run: EffectFn,
    sources: HashSet<(SubjectId, Field)>,
    owner: Option<EffectId>,
    children: Vec<EffectId>,
}

// =============================================================================
// Runtime State
// =============================================================================

#[derive(Default)]
struct Runtime {
    next_id: u64,
    /// `None` entries come from `untrack` and hide everything below them.
    stack: Vec<Option<EffectId>>,
    effects: HashMap<EffectId, EffectEntry>,
    graph: HashMap<SubjectId, HashMap<Field, BTreeSet<EffectId>>>,
}

impl Runtime {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn observer(&self) -> Option<EffectId> {
        self.stack.last().copied().flatten()
    }

    fn clear_sources(&mut self, id: EffectId) {
        let Some(entry) = self.effects.get_mut(&id) else {
            return;
        };
        for (subject, field) in entry.sources.drain() {
            if let Some(fields) = self.graph.get_mut(&subject) {
                if let Some(subs) = fields.get_mut(field) {
                    subs.remove(&id);
                    if subs.is_empty() {
                        fields.remove(field);
                    }
                }
            }
        }
    }

    /// Remove `id` and everything it owns. Returns the dropped closures so
    /// the caller can release them outside the runtime borrow.
    fn dispose(&mut self, id: EffectId, dropped: &mut Vec<EffectFn>) {
        self.clear_sources(id);
        let Some(entry) = self.effects.remove(&id) else {
            return;
        };
        if let Some(owner) = entry.owner {
            if let Some(owner_entry) = self.effects.get_mut(&owner) {
                owner_entry.children.retain(|child| *child != id);
            }
        }
        for child in entry.children {
            self.dispose(child, dropped);
        }
        dropped.push(entry.run);
    }
}

thread_local! {
    static RUNTIME: RefCell<Runtime> = RefCell::new(Runtime::default());
}

// =============================================================================
// Subjects
// =============================================================================

pub(crate) fn next_subject_id() -> SubjectId {
    RUNTIME.with(|rt| SubjectId(rt.borrow_mut().next()))
}

/// Forget every subscription on a subject that is being dropped.
pub(crate) fn forget_subject(subject: SubjectId) {
    // The runtime may already be gone during thread teardown.
    let _ = RUNTIME.try_with(|rt| {
        if let Ok(mut rt) = rt.try_borrow_mut() {
            rt.graph.remove(&subject);
        }
    });
}

// =============================================================================
// Track / Trigger
// =============================================================================

/// Register the running computation, if any, as a subscriber of
/// `(subject, field)`.
pub(crate) fn track(subject: SubjectId, field: Field) {
    RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        let Some(observer) = rt.observer() else {
            return;
        };
        let Some(entry) = rt.effects.get_mut(&observer) else {
            return;
        };
        entry.sources.insert((subject, field));
        rt.graph
            .entry(subject)
            .or_default()
            .entry(field)
            .or_default()
            .insert(observer);
    })
}

/// Run every subscriber of any of `fields` on `subject`, each once, in
/// creation order.
pub(crate) fn trigger(subject: SubjectId, fields: &[Field]) {
    let subscribers: BTreeSet<EffectId> = RUNTIME.with(|rt| {
        let rt = rt.borrow();
        let Some(by_field) = rt.graph.get(&subject) else {
            return BTreeSet::new();
        };
        fields
            .iter()
            .filter_map(|field| by_field.get(field))
            .flat_map(|subs| subs.iter().copied())
            .collect()
    });

    for id in subscribers {
        run_effect(id);
    }
}

// =============================================================================
// Effects
// =============================================================================

/// Pops the stack even if the computation panics.
struct StackGuard;

impl Drop for StackGuard {
    fn drop(&mut self) {
        let _ = RUNTIME.try_with(|rt| {
            if let Ok(mut rt) = rt.try_borrow_mut() {
                rt.stack.pop();
            }
        });
    }
}

pub(crate) fn create_effect(f: Box<dyn FnMut()>) -> EffectId {
    let id = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        let id = EffectId(rt.next());
        let owner = rt.observer();
        rt.effects.insert(
            id,
            EffectEntry {
                run: Rc::new(RefCell::new(f)),
                sources: HashSet::new(),
                owner,
                children: Vec::new(),
            },
        );
        if let Some(owner) = owner {
            if let Some(owner_entry) = rt.effects.get_mut(&owner) {
                owner_entry.children.push(id);
            }
        }
        id
    });
    run_effect(id);
    id
}

/// Re-run an effect: drop its owned effects and old subscriptions, then run
/// it on top of the stack so its reads subscribe afresh.
///
/// An effect already on the stack is not re-entered.
pub(crate) fn run_effect(id: EffectId) {
    let prepared = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        if rt.stack.contains(&Some(id)) {
            tracing::debug!(effect = %id, "effect already running, re-entry skipped");
            return None;
        }
        let entry = rt.effects.get_mut(&id)?;
        let run = entry.run.clone();
        let children = std::mem::take(&mut entry.children);
        let mut dropped = Vec::new();
        for child in children {
            rt.dispose(child, &mut dropped);
        }
        rt.clear_sources(id);
        rt.stack.push(Some(id));
        Some((run, dropped))
    });
    let Some((run, dropped)) = prepared else {
        return;
    };
    drop(dropped);

    let _guard = StackGuard;
    tracing::trace!(effect = %id, "running effect");
    if let Ok(mut f) = run.try_borrow_mut() {
        f();
    }
}

pub(crate) fn dispose_effect(id: EffectId) {
    let dropped = RUNTIME.with(|rt| {
        let mut dropped = Vec::new();
        rt.borrow_mut().dispose(id, &mut dropped);
        dropped
    });
    drop(dropped);
}

pub(crate) fn is_alive(id: EffectId) -> bool {
    RUNTIME.with(|rt| rt.borrow().effects.contains_key(&id))
}

/// Run `f` with tracking suspended.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    RUNTIME.with(|rt| rt.borrow_mut().stack.push(None));
    let _guard = StackGuard;
    f()
}

/// The computation tracked reads currently register against.
pub fn active_effect() -> Option<EffectId> {
    RUNTIME.with(|rt| rt.borrow().observer())
}

/// Number of computations subscribed to `(subject, field)`.
pub fn subscriber_count(subject: SubjectId, field: Field) -> usize {
    RUNTIME.with(|rt| {
        rt.borrow()
            .graph
            .get(&subject)
            .and_then(|fields| fields.get(field))
            .map_or(0, BTreeSet::len)
    })
}

/// Number of live effects on this thread.
pub fn effect_count() -> usize {
    RUNTIME.with(|rt| rt.borrow().effects.len())
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Drop every effect and subscription on this thread.
pub fn reset_runtime() {
    let old = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        let fresh = Runtime {
            next_id: rt.next_id,
            ..Runtime::default()
        };
        std::mem::replace(&mut *rt, fresh)
    });
    drop(old);
}
