//! App mount - the render effect and its batched commits.
//!
//! # Example
//!
//! ```
//! use spark_vdom::host::MemoryHost;
//! use spark_vdom::pipeline::App;
//! use spark_vdom::reactive::reactive;
//! use spark_vdom::scheduler::Scheduler;
//! use spark_vdom::vnode::element;
//!
//! struct Counter { count: i64 }
//!
//! let mut host = MemoryHost::new();
//! let root = host.create_root("app");
//! let state = reactive(Counter { count: 0 });
//!
//! let s = state.clone();
//! let app = App::mount_with(host, root, Scheduler::new(), move || {
//!     let count = s.read("count", |c| c.count);
//!     element("p").child(format!("Count: {count}")).build()
//! })
//! .unwrap();
//!
//! state.write("count", |c| c.count += 1);
//! app.tick();
//! assert_eq!(app.with_host(|h| h.inner_markup(root)), "<p>Count: 1</p>");
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::error::{RenderError, Result};
use crate::host::HostAdapter;
use crate::reactive::{effect, EffectHandle};
use crate::reconcile::diff;
use crate::renderer::{apply, detach, mount, release_quietly, Mounted};
use crate::scheduler::{default_scheduler, FlushReport, Scheduler};
use crate::vnode::VNode;

// =============================================================================
// App state
// =============================================================================

struct AppState<A: HostAdapter> {
    host: A,
    parent: A::Handle,
    /// Description the host currently mirrors.
    current: Option<VNode>,
    root: Option<Mounted<A::Handle>>,
    /// Set after a failed apply; the next commit remounts.
    poisoned: bool,
    last_error: Option<RenderError>,
    commits: usize,
}

impl<A: HostAdapter> AppState<A> {
    fn commit(&mut self, tree: VNode) -> Result<()> {
        let (Some(old), Some(root)) = (self.current.as_ref(), self.root.as_mut()) else {
            return self.remount(tree);
        };
        if self.poisoned {
            return self.remount(tree);
        }

        let script = diff(old, &tree);
        self.commits += 1;
        if script.is_noop() {
            self.current = Some(tree);
            return Ok(());
        }

        let stats = script.stats();
        let span = tracing::debug_span!("apply", ops = script.ops().len(), structural = stats.structural());
        let _enter = span.enter();

        match apply(&mut self.host, &self.parent, root, &script) {
            Ok(()) => {
                self.current = Some(tree);
                Ok(())
            }
            Err(err) => {
                self.poisoned = true;
                Err(err)
            }
        }
    }

    /// Drop whatever is mounted and mount `tree` from scratch.
    fn remount(&mut self, tree: VNode) -> Result<()> {
        self.poisoned = true;
        if let Some(root) = self.root.take() {
            if let Err(err) = detach(&mut self.host, &self.parent, &root) {
                tracing::warn!(error = %err, "could not detach old tree");
            }
            release_quietly(&mut self.host, &root);
        }
        self.current = None;

        let mounted = mount(&mut self.host, &tree, &self.parent)?;
        self.root = Some(mounted);
        self.current = Some(tree);
        self.poisoned = false;
        self.commits += 1;
        Ok(())
    }

    fn record(&mut self, result: &Result<()>) {
        if let Err(err) = result {
            tracing::warn!(error = %err, "render commit failed");
            self.last_error = Some(err.clone());
        }
    }
}

struct Shared<A: HostAdapter> {
    state: RefCell<AppState<A>>,
    scheduler: Scheduler,
    /// Latest rendered tree not yet committed.
    pending: RefCell<Option<VNode>>,
    commit_queued: Cell<bool>,
    painted: Cell<bool>,
    stopped: Cell<bool>,
}

impl<A: HostAdapter + 'static> Shared<A> {
    /// Take a freshly rendered tree from the render effect.
    fn receive(self: &Rc<Self>, tree: VNode) {
        if self.stopped.get() {
            return;
        }
        if !self.painted.get() {
            if let Ok(mut state) = self.state.try_borrow_mut() {
                self.painted.set(true);
                let result = state.remount(tree);
                state.record(&result);
                return;
            }
        }

        *self.pending.borrow_mut() = Some(tree);
        if !self.commit_queued.replace(true) {
            self.queue_commit();
        }
    }

    fn queue_commit(self: &Rc<Self>) {
        let weak: Weak<Self> = Rc::downgrade(self);
        self.scheduler.queue_update(move || match weak.upgrade() {
            Some(shared) => shared.commit(),
            None => Ok(()),
        });
    }

    fn commit(self: &Rc<Self>) -> Result<()> {
        self.commit_queued.set(false);
        if self.stopped.get() {
            return Ok(());
        }
        let Some(tree) = self.pending.borrow_mut().take() else {
            return Ok(());
        };

        let Ok(mut state) = self.state.try_borrow_mut() else {
            // host is borrowed by the caller of this flush; retry next flush
            tracing::debug!("app state busy, commit deferred");
            *self.pending.borrow_mut() = Some(tree);
            self.commit_queued.set(true);
            self.queue_commit();
            return Ok(());
        };
        let result = state.commit(tree);
        state.record(&result);
        result
    }
}

// =============================================================================
// App
// =============================================================================

/// A mounted application.
///
/// Owns the host, the render effect and the mounted tree. Reactive writes
/// read by `render` re-run it; the new tree is committed at the next flush
/// of the app's scheduler, once per flush no matter how many writes came
/// before it.
pub struct App<A: HostAdapter + 'static> {
    shared: Rc<Shared<A>>,
    effect: Option<EffectHandle>,
}

impl<A: HostAdapter + 'static> App<A> {
    /// Mount on this thread's default scheduler.
    pub fn mount(host: A, parent: A::Handle, render: impl FnMut() -> VNode + 'static) -> Result<Self> {
        Self::mount_with(host, parent, default_scheduler(), render)
    }

    /// Mount `render`'s tree under `parent`.
    ///
    /// The first render is mounted synchronously (first paint); its failure
    /// is returned here and leaves nothing running.
    pub fn mount_with(
        host: A,
        parent: A::Handle,
        scheduler: Scheduler,
        mut render: impl FnMut() -> VNode + 'static,
    ) -> Result<Self> {
        let shared = Rc::new(Shared {
            state: RefCell::new(AppState {
                host,
                parent,
                current: None,
                root: None,
                poisoned: false,
                last_error: None,
                commits: 0,
            }),
            scheduler,
            pending: RefCell::new(None),
            commit_queued: Cell::new(false),
            painted: Cell::new(false),
            stopped: Cell::new(false),
        });

        let weak = Rc::downgrade(&shared);
        let handle = effect(move || {
            let tree = render();
            // component reads belong to this effect too
            tree.resolve();
            if let Some(shared) = weak.upgrade() {
                shared.receive(tree);
            }
        });

        let first_error = shared.state.borrow_mut().last_error.take();
        if let Some(err) = first_error {
            shared.stopped.set(true);
            handle.stop();
            return Err(err);
        }

        Ok(Self {
            shared,
            effect: Some(handle),
        })
    }

    /// Queue an arbitrary update on the app's scheduler.
    pub fn schedule_update(&self, update: impl FnOnce() -> Result<()> + 'static) -> bool {
        self.shared.scheduler.queue_update(update)
    }

    /// Re-run `render` now. Its tree is committed at the next flush; after a
    /// failed commit this is how to retry.
    pub fn refresh(&self) {
        if let Some(effect) = &self.effect {
            effect.rerun();
        }
    }

    /// Run one flush of the app's scheduler.
    pub fn tick(&self) -> FlushReport {
        self.shared.scheduler.flush()
    }

    /// Flush until nothing is pending.
    pub fn run_until_idle(&self) -> Result<FlushReport> {
        self.shared.scheduler.run_until_idle()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.shared.scheduler
    }

    pub fn with_host<R>(&self, f: impl FnOnce(&A) -> R) -> R {
        f(&self.shared.state.borrow().host)
    }

    /// Mutable access to the host, e.g. to configure it between commits.
    pub fn with_host_mut<R>(&self, f: impl FnOnce(&mut A) -> R) -> R {
        f(&mut self.shared.state.borrow_mut().host)
    }

    /// Host handle of the mounted root, if mounted.
    pub fn root_handle(&self) -> Option<A::Handle> {
        let state = self.shared.state.borrow();
        state.root.as_ref().map(|root| root.handle.clone())
    }

    /// Description the host currently mirrors.
    pub fn current_tree(&self) -> Option<VNode> {
        self.shared.state.borrow().current.clone()
    }

    pub fn last_error(&self) -> Option<RenderError> {
        self.shared.state.borrow().last_error.clone()
    }

    pub fn take_error(&self) -> Option<RenderError> {
        self.shared.state.borrow_mut().last_error.take()
    }

    /// Commits performed, counting remounts and no-op diffs.
    pub fn commit_count(&self) -> usize {
        self.shared.state.borrow().commits
    }

    pub fn is_mounted(&self) -> bool {
        self.shared.state.borrow().root.is_some()
    }

    /// True after a failed commit until the next successful remount.
    pub fn is_poisoned(&self) -> bool {
        self.shared.state.borrow().poisoned
    }

    /// Stop the render effect and remove the tree from the host.
    ///
    /// The host stays inspectable through [`with_host`](Self::with_host).
    pub fn unmount(&mut self) -> Result<()> {
        self.stop();
        let mut state = self.shared.state.borrow_mut();
        let root = state.root.take().ok_or(RenderError::NotMounted)?;
        state.current = None;
        let AppState { host, parent, .. } = &mut *state;
        crate::renderer::unmount(host, parent, &root)
    }

    fn stop(&mut self) {
        self.shared.stopped.set(true);
        self.shared.pending.borrow_mut().take();
        if let Some(effect) = self.effect.take() {
            effect.stop();
        }
    }
}

impl<A: HostAdapter + 'static> Drop for App<A> {
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// Tests
// =============================================================================
