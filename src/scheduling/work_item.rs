//! # Work Item Contract
//!
//! This module defines the fundamental unit-of-work trait of the scheduling
//! system.
//!
//! ## Lifecycle
//! A work item moves through *Pending -> Running -> {Completed | Failed |
//! Cancelled}*. Transitions are monotonic and never revisited: a given
//! instance executes at most once, and exactly one of `work_complete` /
//! `work_failed` fires for every item that runs.

use crate::scheduling::monitor::ProgressMonitor;

/// A unit of work that can be scheduled on the thread pool.
///
/// Work items are the primary mechanism for offloading computation from the
/// main thread. They should be self-contained and own the data they need;
/// shared state goes behind an [`MtResource`](crate::core::MtResource) or
/// similar.
///
/// # Implementation Guidelines
/// - Must be `Send + Sync` so queues and monitors can reference the item
///   across threads
/// - Failure is signalled by returning `Err`; the executor converts it into a
///   `work_failed` callback on the monitor (panics are caught the same way)
/// - A `false` return from `update_progress` is the only cancellation signal;
///   no thread is ever interrupted
pub trait WorkItem: Send + Sync {
    /// Human-readable name of the work item, used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Performs the unit's computation on the calling thread.
    ///
    /// Implementations should periodically call
    /// `monitor.update_progress(self, p)` with `p` in `[0, 1]` and stop as
    /// soon as practical when it returns `false`. No item is required to
    /// report progress more than once; a single terminal
    /// `update_progress(self, 1.0)` is an acceptable minimal implementation.
    ///
    /// # Returns
    /// `Ok(())` on success (including a cooperative early exit after a
    /// cancellation request); `Err` if the work failed.
    fn do_work(&self, monitor: &dyn ProgressMonitor) -> anyhow::Result<()>;
}
