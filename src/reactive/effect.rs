//! Effects - computations that re-run when what they read changes.

use super::runtime::{self, EffectId};

/// Handle to a running effect.
///
/// Dropping the handle does NOT stop the effect; effects live until
/// [`stop`](EffectHandle::stop) is called or their owning effect re-runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectHandle {
    id: EffectId,
}

impl EffectHandle {
    pub fn id(&self) -> EffectId {
        self.id
    }

    /// Run the effect again now, re-collecting its dependencies.
    pub fn rerun(&self) {
        runtime::run_effect(self.id);
    }

    /// Dispose the effect and every effect it created.
    pub fn stop(self) {
        runtime::dispose_effect(self.id);
    }

    pub fn is_active(&self) -> bool {
        runtime::is_alive(self.id)
    }
}

/// Create an effect and run it once immediately.
///
/// Every tracked read made during a run subscribes the effect; a write to any
/// of those fields runs it again. Subscriptions from the previous run are
/// dropped first, so an effect only listens to what its latest run read.
///
/// Effects nest: one created while another runs belongs to it, tracks its own
/// reads, and is disposed before its owner's next run.
pub fn effect(f: impl FnMut() + 'static) -> EffectHandle {
    EffectHandle {
        id: runtime::create_effect(Box::new(f)),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{active_effect, effect_count, reactive, reset_runtime, untrack};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    struct Flags {
        show: bool,
        a: i32,
        b: i32,
    }

    fn flags() -> crate::reactive::Reactive<Flags> {
        reactive(Flags {
            show: true,
            a: 0,
            b: 0,
        })
    }

    #[test]
    fn test_effect_runs_immediately() {
        reset_runtime();
        let ran = Rc::new(Cell::new(false));
        let r = ran.clone();
        let handle = effect(move || r.set(true));
        assert!(ran.get());
        assert!(handle.is_active());
        assert_eq!(active_effect(), None);
    }

    #[test]
    fn test_dependencies_follow_latest_run() {
        reset_runtime();
        let state = flags();
        let runs = Rc::new(Cell::new(0));

        let (s, r) = (state.clone(), runs.clone());
        effect(move || {
            r.set(r.get() + 1);
            if s.read("show", |f| f.show) {
                s.read("a", |f| f.a);
            } else {
                s.read("b", |f| f.b);
            }
        });
        assert_eq!(runs.get(), 1);
        assert_eq!(state.subscriber_count("a"), 1);
        assert_eq!(state.subscriber_count("b"), 0);

        state.write("show", |f| f.show = false);
        assert_eq!(runs.get(), 2);
        assert_eq!(state.subscriber_count("a"), 0);
        assert_eq!(state.subscriber_count("b"), 1);

        // `a` is no longer read, writing it is silent
        state.write("a", |f| f.a = 7);
        assert_eq!(runs.get(), 2);

        state.write("b", |f| f.b = 7);
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn test_nested_effects_track_separately() {
        reset_runtime();
        let state = flags();
        let outer_runs = Rc::new(Cell::new(0));
        let inner_runs = Rc::new(Cell::new(0));

        let (s, o, i) = (state.clone(), outer_runs.clone(), inner_runs.clone());
        effect(move || {
            o.set(o.get() + 1);
            let (s2, i2) = (s.clone(), i.clone());
            effect(move || {
                i2.set(i2.get() + 1);
                s2.read("b", |f| f.b);
            });
            // read after the inner effect finished still lands on the outer one
            s.read("a", |f| f.a);
        });
        assert_eq!((outer_runs.get(), inner_runs.get()), (1, 1));
        assert_eq!(state.subscriber_count("a"), 1);
        assert_eq!(state.subscriber_count("b"), 1);

        state.write("b", |f| f.b += 1);
        assert_eq!((outer_runs.get(), inner_runs.get()), (1, 2));

        // outer re-run disposes the old inner effect and creates a new one
        state.write("a", |f| f.a += 1);
        assert_eq!((outer_runs.get(), inner_runs.get()), (2, 3));
        assert_eq!(state.subscriber_count("b"), 1);
        assert_eq!(effect_count(), 2);
    }

    #[test]
    fn test_stop_unsubscribes() {
        reset_runtime();
        let state = flags();
        let runs = Rc::new(Cell::new(0));

        let (s, r) = (state.clone(), runs.clone());
        let handle = effect(move || {
            s.read("a", |f| f.a);
            r.set(r.get() + 1);
        });
        handle.stop();
        assert!(!handle.is_active());

        state.write("a", |f| f.a = 1);
        assert_eq!(runs.get(), 1);
        assert_eq!(state.subscriber_count("a"), 0);
    }

    #[test]
    fn test_untrack() {
        reset_runtime();
        let state = flags();

        let s = state.clone();
        effect(move || {
            untrack(|| s.read("a", |f| f.a));
            s.read("b", |f| f.b);
        });
        assert_eq!(state.subscriber_count("a"), 0);
        assert_eq!(state.subscriber_count("b"), 1);
    }

    #[test]
    fn test_self_write_does_not_recurse() {
        reset_runtime();
        let state = flags();
        let runs = Rc::new(Cell::new(0));

        let (s, r) = (state.clone(), runs.clone());
        effect(move || {
            r.set(r.get() + 1);
            let a = s.read("a", |f| f.a);
            if a < 10 {
                s.write("a", |f| f.a = a + 1);
            }
        });
        assert_eq!(runs.get(), 1);
        assert_eq!(state.peek(|f| f.a), 1);
    }

    #[test]
    fn test_write_inside_effect_runs_other_effects() {
        reset_runtime();
        let state = flags();
        let log = Rc::new(RefCell::new(Vec::new()));

        let (s, l) = (state.clone(), log.clone());
        effect(move || {
            let b = s.read("b", |f| f.b);
            l.borrow_mut().push(format!("b={b}"));
        });

        let s = state.clone();
        effect(move || {
            let a = s.read("a", |f| f.a);
            s.write("b", |f| f.b = a * 2);
        });

        state.write("a", |f| f.a = 4);
        assert_eq!(*log.borrow(), vec!["b=0", "b=0", "b=8"]);
    }
}
