//! Update scheduler - coalesces update requests into batched flushes.
//!
//! `queue_update` never runs anything. It appends to the pending queue and,
//! if no flush is scheduled yet, schedules one by calling the wake hook. The
//! host runs the flush at its next deferred boundary (after the current
//! synchronous work unwinds), typically from its event loop:
//!
//! ```text
//! write ─▶ effect ─▶ queue_update ─┐
//! write ─▶ effect ─▶ queue_update ─┼─▶ [pending] ──(boundary)──▶ flush()
//! write ─▶ effect ─▶ queue_update ─┘                              runs all, FIFO
//! ```
//!
//! # Invariants
//!
//! 1. A flush swaps the queue out first, then runs the swapped-out closures
//!    in insertion order, each exactly once.
//! 2. Closures queued during a flush land in the next flush.
//! 3. A flush never starts inside another flush.
//! 4. There is no cancellation: a queued closure always runs, even if an
//!    earlier one in the same flush failed.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{RenderError, Result};

/// A queued update.
pub type UpdateFn = Box<dyn FnOnce() -> Result<()>>;

/// Hook called when a flush becomes scheduled.
pub type WakeFn = Rc<dyn Fn()>;

// =============================================================================
// Config
// =============================================================================

/// Scheduler settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Upper bound on consecutive flushes in [`Scheduler::run_until_idle`].
    /// Hitting it means updates keep scheduling updates.
    pub max_flush_passes: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_flush_passes: 100,
        }
    }
}

impl SchedulerConfig {
    pub fn with_max_flush_passes(mut self, passes: usize) -> Self {
        self.max_flush_passes = passes.max(1);
        self
    }
}

// =============================================================================
// Flush Report
// =============================================================================

/// Outcome of one or more flushes.
#[derive(Debug, Default, PartialEq)]
pub struct FlushReport {
    /// Closures run.
    pub ran: usize,
    /// Flushes performed.
    pub flushes: usize,
    /// Errors returned by closures, in run order.
    pub errors: Vec<RenderError>,
}

impl FlushReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// First error, if any closure failed.
    pub fn into_result(self) -> Result<usize> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.ran),
        }
    }

    fn absorb(&mut self, other: FlushReport) {
        self.ran += other.ran;
        self.flushes += other.flushes;
        self.errors.extend(other.errors);
    }
}

// =============================================================================
// Scheduler
// =============================================================================

#[derive(Default)]
struct SchedulerState {
    queue: Vec<UpdateFn>,
    scheduled: bool,
    flushing: bool,
    flush_count: u64,
    wake: Option<WakeFn>,
    config: SchedulerConfig,
}

/// Batching update queue. Clones share the same queue.
#[derive(Clone, Default)]
pub struct Scheduler {
    state: Rc<RefCell<SchedulerState>>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Scheduler")
            .field("pending", &state.queue.len())
            .field("scheduled", &state.scheduled)
            .field("flushing", &state.flushing)
            .field("flush_count", &state.flush_count)
            .field("config", &state.config)
            .finish()
    }
}

/// Clears the flushing flag even if a closure panics.
struct FlushGuard<'a>(&'a RefCell<SchedulerState>);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.0.try_borrow_mut() {
            state.flushing = false;
        }
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        let scheduler = Self::default();
        scheduler.state.borrow_mut().config = config;
        scheduler
    }

    pub fn config(&self) -> SchedulerConfig {
        self.state.borrow().config.clone()
    }

    /// Install the hook that tells the host a flush is due.
    pub fn set_wake(&self, wake: impl Fn() + 'static) {
        self.state.borrow_mut().wake = Some(Rc::new(wake));
    }

    /// Queue an update for the next flush.
    ///
    /// Returns true if this call scheduled the flush (the queue was idle).
    pub fn queue_update(&self, update: impl FnOnce() -> Result<()> + 'static) -> bool {
        let wake = {
            let mut state = self.state.borrow_mut();
            state.queue.push(Box::new(update));
            if state.scheduled {
                return false;
            }
            state.scheduled = true;
            state.wake.clone()
        };
        tracing::trace!("flush scheduled");
        if let Some(wake) = wake {
            wake();
        }
        true
    }

    /// True if a flush is due.
    pub fn is_scheduled(&self) -> bool {
        self.state.borrow().scheduled
    }

    /// Number of queued closures.
    pub fn pending(&self) -> usize {
        self.state.borrow().queue.len()
    }

    /// Number of flushes that ran at least one closure.
    pub fn flush_count(&self) -> u64 {
        self.state.borrow().flush_count
    }

    /// Run one flush: everything queued right now, nothing queued while it
    /// runs. A call made from inside a running flush does nothing.
    pub fn flush(&self) -> FlushReport {
        let batch = {
            let mut state = self.state.borrow_mut();
            if state.flushing {
                tracing::debug!("flush requested during a flush, ignored");
                return FlushReport::default();
            }
            state.scheduled = false;
            if state.queue.is_empty() {
                return FlushReport::default();
            }
            state.flushing = true;
            state.flush_count += 1;
            std::mem::take(&mut state.queue)
        };
        let _guard = FlushGuard(&self.state);

        let span = tracing::debug_span!("flush", updates = batch.len());
        let _enter = span.enter();

        let mut report = FlushReport {
            flushes: 1,
            ..FlushReport::default()
        };
        for update in batch {
            report.ran += 1;
            if let Err(err) = update() {
                tracing::warn!(error = %err, "scheduled update failed");
                report.errors.push(err);
            }
        }
        report
    }

    /// Flush until the queue stays empty.
    ///
    /// Fails with [`RenderError::FlushLimitExceeded`] if updates are still
    /// pending after `max_flush_passes` flushes.
    pub fn run_until_idle(&self) -> Result<FlushReport> {
        let passes = self.config().max_flush_passes;
        let mut total = FlushReport::default();
        for _ in 0..passes {
            if self.pending() == 0 {
                return Ok(total);
            }
            total.absorb(self.flush());
        }
        if self.pending() == 0 {
            Ok(total)
        } else {
            Err(RenderError::FlushLimitExceeded { passes })
        }
    }

    /// Drop every pending update without running it.
    pub fn clear(&self) {
        let dropped = {
            let mut state = self.state.borrow_mut();
            state.scheduled = false;
            std::mem::take(&mut state.queue)
        };
        drop(dropped);
    }
}

// =============================================================================
// Thread-local default scheduler
// =============================================================================

thread_local! {
    static DEFAULT_SCHEDULER: Scheduler = Scheduler::new();
}

/// Handle to this thread's default scheduler.
pub fn default_scheduler() -> Scheduler {
    DEFAULT_SCHEDULER.with(Scheduler::clone)
}

/// Queue an update on the default scheduler.
pub fn queue_update(update: impl FnOnce() -> Result<()> + 'static) -> bool {
    DEFAULT_SCHEDULER.with(|s| s.queue_update(update))
}

/// Flush the default scheduler once.
pub fn flush() -> FlushReport {
    default_scheduler().flush()
}

/// Reset the default scheduler (for testing).
pub fn reset_scheduler() {
    DEFAULT_SCHEDULER.with(|s| {
        s.clear();
        let mut state = s.state.borrow_mut();
        state.flush_count = 0;
        state.wake = None;
        state.config = SchedulerConfig::default();
    });
}

// =============================================================================
// Tests
// =============================================================================
