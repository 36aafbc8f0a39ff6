//! # Progress Monitors
//!
//! This module defines the observer contract a work item reports to, plus the
//! stock implementations the rest of the engine and its consumers lean on:
//!
//! - `NullMonitor`: always-continue no-op, for callers with no progress UI
//! - `LogMonitor`: forwards callbacks to the `log` facade
//! - `CancellationToken` / `CancelMonitor`: an explicit cancellation flag and
//!   the thin boolean-returning monitor wrapped around it
//!
//! Monitors are stateless observers as far as the engine is concerned: they
//! hold no ownership over work items, and several monitors may observe one
//! queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::scheduling::work_item::WorkItem;

/// Observer contract for a work item's execution.
///
/// All outcomes of a unit of work are funnelled through this protocol rather
/// than through errors crossing the submission boundary; submission is
/// fire-and-forget. A consumer that needs a failure to be fatal must implement
/// a monitor that escalates explicitly.
pub trait ProgressMonitor: Send + Sync {
    /// Reports progress in `[0, 1]` for `item`.
    ///
    /// # Returns
    /// `true` to continue, `false` to request cooperative cancellation. The
    /// item is expected to observe a `false` return and stop as soon as
    /// practical; nothing is preempted on its behalf.
    fn update_progress(&self, item: &dyn WorkItem, progress: f32) -> bool;

    /// Called when `item`'s execution raised an error.
    ///
    /// Must not panic; the executor logs and swallows anything escaping a
    /// monitor so a worker thread can never be taken down by an observer.
    fn work_failed(&self, item: &dyn WorkItem, error: &anyhow::Error);

    /// Called exactly once for a successfully finished item.
    fn work_complete(&self, item: &dyn WorkItem);
}

/// A monitor that always continues and ignores every callback.
///
/// Used when a caller needs a monitor but has no progress UI, e.g. direct
/// submissions and synchronous unit tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMonitor;

impl ProgressMonitor for NullMonitor {
    fn update_progress(&self, _item: &dyn WorkItem, _progress: f32) -> bool {
        true
    }

    fn work_failed(&self, _item: &dyn WorkItem, _error: &anyhow::Error) {}

    fn work_complete(&self, _item: &dyn WorkItem) {}
}

/// A monitor that forwards every callback to the `log` facade.
///
/// Progress is logged at `trace`, completion at `debug`, failure at `error`.
/// Always continues.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMonitor;

impl ProgressMonitor for LogMonitor {
    fn update_progress(&self, item: &dyn WorkItem, progress: f32) -> bool {
        log::trace!("`{}` progress: {:.0}%", item.name(), progress * 100.0);
        true
    }

    fn work_failed(&self, item: &dyn WorkItem, error: &anyhow::Error) {
        log::error!("`{}` failed: {:#}", item.name(), error);
    }

    fn work_complete(&self, item: &dyn WorkItem) {
        log::debug!("`{}` complete", item.name());
    }
}

/// An explicit, shareable cancellation flag.
///
/// This is the signal underlying the boolean return of
/// [`ProgressMonitor::update_progress`]: a work queue flips its token when any
/// registered monitor asks to stop, and [`CancelMonitor`] is the thin monitor
/// wrapper for threading the same signal into a `do_work` call directly.
///
/// Cloning a token yields a handle to the same flag.
#[derive(Debug, Default, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a new, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Irreversible.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns `true` once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// A monitor whose continue/stop answer mirrors a [`CancellationToken`].
///
/// `update_progress` returns `true` until the token is cancelled; the other
/// callbacks are no-ops.
#[derive(Debug, Clone)]
pub struct CancelMonitor {
    token: CancellationToken,
}

impl CancelMonitor {
    /// Creates a monitor observing `token`.
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }
}

impl ProgressMonitor for CancelMonitor {
    fn update_progress(&self, _item: &dyn WorkItem, _progress: f32) -> bool {
        !self.token.is_cancelled()
    }

    fn work_failed(&self, _item: &dyn WorkItem, _error: &anyhow::Error) {}

    fn work_complete(&self, _item: &dyn WorkItem) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::source_sink::SourceSinkBuilder;

    #[test]
    fn null_monitor_always_continues() {
        let item = SourceSinkBuilder::new()
            .source(|| ())
            .sink(|_| {})
            .build("probe")
            .unwrap();
        assert!(NullMonitor.update_progress(&item, 0.0));
        assert!(NullMonitor.update_progress(&item, 1.0));
    }

    #[test]
    fn cancel_monitor_tracks_its_token() {
        let item = SourceSinkBuilder::new()
            .source(|| ())
            .sink(|_| {})
            .build("probe")
            .unwrap();
        let token = CancellationToken::new();
        let monitor = CancelMonitor::new(token.clone());
        assert!(monitor.update_progress(&item, 0.5));
        token.cancel();
        assert!(!monitor.update_progress(&item, 0.5));
        assert!(token.is_cancelled());
    }
}
