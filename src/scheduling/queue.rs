//! # Work Queue
//!
//! An ordered collection of pending work items bound to an executor.
//!
//! ## Draining Algorithm
//!
//! On `start()`, the queue submits its head item to the executor through an
//! internal wrapper monitor that (a) forwards every `update_progress` /
//! `work_failed` / `work_complete` call to all registered monitors, and (b)
//! upon the item's terminal callback, decrements the outstanding count and -
//! unless the queue has been cancelled - submits the next pending item.
//!
//! A single queue runs its items **serially** (concurrency degree 1 per
//! queue) even though the underlying executor supports many concurrent
//! workers across queues. Startup-time batches get deterministic, bounded
//! resource usage out of this, and for a non-cancelled run terminal callbacks
//! occur in the same order items were added. The count is decremented
//! *before* the terminal fan-out, so a monitor reading
//! [`WorkQueue::number_of_work_items_in_queue`] inside `work_complete` sees
//! the post-item value; the callback that reads `0` is the one that closes a
//! dependent splash surface.
//!
//! ## Cancellation
//!
//! *Running -> Cancelling -> Cancelled*. Any registered monitor returning
//! `false` from `update_progress` (or a call to [`WorkQueue::cancel`]) moves
//! the queue to *Cancelling*: no further pending items are submitted, and the
//! running item is expected to observe the same `false` return and exit
//! voluntarily. Once it reaches a terminal state the queue is *Cancelled* and
//! still-pending items are discarded without ever running. Discarded items
//! receive no callbacks; silent drop is this queue's documented policy.
//!
//! One item's failure does not cancel anything: the batch keeps draining
//! unless a monitor escalates by cancelling.

use std::collections::VecDeque;
use std::sync::Arc;

use log::{debug, warn};

use crate::core::MtResource;
use crate::scheduling::executor::ThreadPoolExecutor;
use crate::scheduling::monitor::{CancellationToken, ProgressMonitor};
use crate::scheduling::work_item::WorkItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueuePhase {
    /// Populated but not yet draining.
    Idle,
    /// Draining (or drained and awaiting further items).
    Running,
    /// Cancellation requested; waiting for the running item to finish.
    Cancelling,
    /// Terminal. Pending items have been discarded.
    Cancelled,
}

struct QueueState {
    pending: VecDeque<Arc<dyn WorkItem>>,
    monitors: Vec<Arc<dyn ProgressMonitor>>,
    phase: QueuePhase,
    /// An item is currently with the executor.
    running: bool,
    /// A terminal fan-out is in flight; the next submission decision has not
    /// been made yet. Blocks `add` from double-dispatching.
    dispatching: bool,
}

/// An ordered, drainable collection of pending work items.
///
/// The queue owns its pending list and monitor set; cloning the handle
/// shares both. `add` is safe from any thread, including concurrently with
/// draining, and items added after the drain has caught up are dispatched
/// directly.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use work_engine::{scheduling::generation, ThreadPoolExecutor, WorkQueue};
///
/// let queue = WorkQueue::new(Arc::new(ThreadPoolExecutor::new(2)));
/// let (tx, rx) = std::sync::mpsc::channel();
/// generation::enqueue_generation(&queue, "heightmap", || [0f32; 64], move |map| {
///     let _ = tx.send(map.len());
/// });
/// queue.start();
/// assert_eq!(rx.recv().unwrap(), 64);
/// ```
pub struct WorkQueue {
    executor: Arc<ThreadPoolExecutor>,
    state: MtResource<QueueState>,
    cancel: CancellationToken,
}

impl WorkQueue {
    /// Creates an empty queue bound to `executor`.
    pub fn new(executor: Arc<ThreadPoolExecutor>) -> Self {
        Self {
            executor,
            state: MtResource::new(QueueState {
                pending: VecDeque::new(),
                monitors: Vec::new(),
                phase: QueuePhase::Idle,
                running: false,
                dispatching: false,
            }),
            cancel: CancellationToken::new(),
        }
    }

    /// Appends `item` to the end of the pending list.
    ///
    /// Safe to call from any thread, including concurrently with draining.
    /// If the queue is already draining and has caught up, the item is
    /// dispatched immediately. Items added after cancellation are discarded
    /// with a warning.
    pub fn add(&self, item: Arc<dyn WorkItem>) {
        let dispatch = {
            let mut state = self.state.get_mut();
            match state.phase {
                QueuePhase::Cancelling | QueuePhase::Cancelled => {
                    warn!(
                        "discarding work item `{}` added to a cancelled queue",
                        item.name()
                    );
                    return;
                }
                QueuePhase::Idle | QueuePhase::Running => {}
            }
            state.pending.push_back(item);
            if state.phase == QueuePhase::Running && !state.running && !state.dispatching {
                state.running = true;
                state.pending.pop_front()
            } else {
                None
            }
        };
        if let Some(item) = dispatch {
            self.submit(item);
        }
    }

    /// Registers an observer.
    ///
    /// All currently pending and subsequently added items report to every
    /// registered monitor. The monitor set is add-only.
    pub fn add_monitor(&self, monitor: Arc<dyn ProgressMonitor>) {
        self.state.get_mut().monitors.push(monitor);
    }

    /// Snapshot count of items not yet completed (pending + currently
    /// running).
    ///
    /// Monotonically non-increasing once draining starts (absent further
    /// `add` calls) and reaches 0 only after the last item's terminal
    /// callback has begun.
    pub fn number_of_work_items_in_queue(&self) -> usize {
        let state = self.state.get();
        state.pending.len() + usize::from(state.running)
    }

    /// Begins draining.
    ///
    /// Calling `start` on an already-started or cancelled queue logs a
    /// warning and does nothing.
    pub fn start(&self) {
        let first = {
            let mut state = self.state.get_mut();
            match state.phase {
                QueuePhase::Idle => {}
                QueuePhase::Running => {
                    warn!("work queue already started");
                    return;
                }
                QueuePhase::Cancelling | QueuePhase::Cancelled => {
                    warn!("work queue already cancelled");
                    return;
                }
            }
            state.phase = QueuePhase::Running;
            debug!(
                "work queue draining {} pending items",
                state.pending.len()
            );
            match state.pending.pop_front() {
                Some(item) => {
                    state.running = true;
                    Some(item)
                }
                None => None,
            }
        };
        if let Some(item) = first {
            self.submit(item);
        }
    }

    /// Requests cooperative cancellation.
    ///
    /// This is the programmatic entry to the same signal a monitor raises by
    /// returning `false` from `update_progress` - used, for example, by a
    /// monitor that wants an item's failure to cancel the rest of the batch.
    /// The running item (if any) is not forcibly stopped; pending items are
    /// discarded silently once it finishes.
    pub fn cancel(&self) {
        self.cancel.cancel();
        let mut state = self.state.get_mut();
        match state.phase {
            QueuePhase::Cancelling | QueuePhase::Cancelled => {}
            QueuePhase::Running if state.running || state.dispatching => {
                debug!("work queue cancelling; waiting for running item");
                state.phase = QueuePhase::Cancelling;
            }
            QueuePhase::Idle | QueuePhase::Running => {
                let discarded = state.pending.len();
                state.pending.clear();
                state.phase = QueuePhase::Cancelled;
                if discarded > 0 {
                    debug!("work queue cancelled; discarded {discarded} pending items");
                }
            }
        }
    }

    /// Returns `true` once the queue has reached its terminal *Cancelled*
    /// state.
    pub fn is_cancelled(&self) -> bool {
        self.state.get().phase == QueuePhase::Cancelled
    }

    /// The cancellation token backing this queue's cooperative-stop signal.
    ///
    /// Flipped as soon as cancellation is requested, before the queue
    /// reaches its terminal state. Work wanting to observe cancellation
    /// without a monitor round-trip can poll this directly.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn submit(&self, item: Arc<dyn WorkItem>) {
        let wrapper = Arc::new(QueueMonitor {
            queue: self.clone(),
        });
        self.executor.submit(item, wrapper);
    }

    fn monitor_snapshot(&self) -> Vec<Arc<dyn ProgressMonitor>> {
        self.state.get().monitors.clone()
    }

    /// Terminal-callback handling for the currently running item: decrement,
    /// fan out, then decide what (if anything) to submit next.
    fn finish_item(&self, item: &dyn WorkItem, failure: Option<&anyhow::Error>) {
        let monitors = {
            let mut state = self.state.get_mut();
            state.running = false;
            state.dispatching = true;
            state.monitors.clone()
        };

        // The count now reads the post-item value; monitors observing it
        // inside the terminal callback see 0 exactly when this was the true
        // last item.
        match failure {
            None => {
                for monitor in &monitors {
                    monitor.work_complete(item);
                }
            }
            Some(error) => {
                for monitor in &monitors {
                    monitor.work_failed(item, error);
                }
            }
        }

        let next = {
            let mut state = self.state.get_mut();
            state.dispatching = false;
            match state.phase {
                QueuePhase::Cancelling => {
                    let discarded = state.pending.len();
                    state.pending.clear();
                    state.phase = QueuePhase::Cancelled;
                    debug!("work queue cancelled; discarded {discarded} pending items");
                    None
                }
                QueuePhase::Running => match state.pending.pop_front() {
                    Some(item) => {
                        state.running = true;
                        Some(item)
                    }
                    None => {
                        debug!("work queue drained");
                        None
                    }
                },
                QueuePhase::Idle | QueuePhase::Cancelled => None,
            }
        };
        if let Some(item) = next {
            self.submit(item);
        }
    }
}

impl AsRef<WorkQueue> for WorkQueue {
    fn as_ref(&self) -> &WorkQueue {
        self
    }
}

impl Clone for WorkQueue {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            state: self.state.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

/// The wrapper monitor a queue interposes between the executor and its
/// registered observers.
///
/// Forwards every callback to all registered monitors and drives the
/// queue's drain: terminal callbacks decrement the outstanding count and
/// trigger submission of the next pending item.
struct QueueMonitor {
    queue: WorkQueue,
}

impl ProgressMonitor for QueueMonitor {
    fn update_progress(&self, item: &dyn WorkItem, progress: f32) -> bool {
        let progress = progress.clamp(0.0, 1.0);
        let mut keep_going = true;
        // Every registered monitor sees every progress report, even after
        // one of them has asked to stop.
        for monitor in self.queue.monitor_snapshot() {
            if !monitor.update_progress(item, progress) {
                keep_going = false;
            }
        }
        if !keep_going {
            self.queue.cancel();
        }
        !self.queue.cancel.is_cancelled()
    }

    fn work_failed(&self, item: &dyn WorkItem, error: &anyhow::Error) {
        self.queue.finish_item(item, Some(error));
    }

    fn work_complete(&self, item: &dyn WorkItem) {
        self.queue.finish_item(item, None);
    }
}
