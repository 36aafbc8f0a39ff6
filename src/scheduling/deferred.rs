//! # Deferred Work Queue
//!
//! A work queue for the "gather now, run later" pattern: items and monitors
//! are registered while some triggering event (a splash screen's first
//! display, say) has not yet occurred, and `start()` is invoked by that event
//! rather than at enqueue time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::scheduling::executor::ThreadPoolExecutor;
use crate::scheduling::monitor::{CancellationToken, ProgressMonitor};
use crate::scheduling::queue::WorkQueue;
use crate::scheduling::work_item::WorkItem;

/// A single-use [`WorkQueue`] whose drain is triggered by an external event.
///
/// Bound to a specific executor at construction, it obeys the full queue
/// contract with one addition: `start()` may be called exactly once.
/// Restart semantics are not well defined for a batch abstraction, so a
/// second call is a programming error and panics.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use work_engine::{scheduling::generation, DeferredWorkQueue, ThreadPoolExecutor};
///
/// let queue = DeferredWorkQueue::new(Arc::new(ThreadPoolExecutor::new(2)));
/// let (tx, rx) = std::sync::mpsc::channel();
/// generation::enqueue_generation(&queue, "startup batch", || 1 + 1, move |n| {
///     let _ = tx.send(n);
/// });
/// // ... later, when the UI becomes visible:
/// queue.start();
/// assert_eq!(rx.recv().unwrap(), 2);
/// ```
pub struct DeferredWorkQueue {
    queue: WorkQueue,
    started: Arc<AtomicBool>,
}

impl DeferredWorkQueue {
    /// Creates an empty deferred queue bound to `executor`.
    pub fn new(executor: Arc<ThreadPoolExecutor>) -> Self {
        Self {
            queue: WorkQueue::new(executor),
            started: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Appends `item` to the batch. See [`WorkQueue::add`].
    pub fn add(&self, item: Arc<dyn WorkItem>) {
        self.queue.add(item);
    }

    /// Registers an observer. See [`WorkQueue::add_monitor`].
    pub fn add_monitor(&self, monitor: Arc<dyn ProgressMonitor>) {
        self.queue.add_monitor(monitor);
    }

    /// Snapshot count of items not yet completed.
    /// See [`WorkQueue::number_of_work_items_in_queue`].
    pub fn number_of_work_items_in_queue(&self) -> usize {
        self.queue.number_of_work_items_in_queue()
    }

    /// Begins draining the batch.
    ///
    /// # Panics
    /// Panics if called more than once; a deferred batch is single-use.
    pub fn start(&self) {
        let already_started = self.started.swap(true, Ordering::AcqRel);
        assert!(
            !already_started,
            "DeferredWorkQueue::start called twice; a deferred batch is single-use"
        );
        self.queue.start();
    }

    /// Requests cooperative cancellation. See [`WorkQueue::cancel`].
    pub fn cancel(&self) {
        self.queue.cancel();
    }

    /// Returns `true` once the queue is terminally cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.queue.is_cancelled()
    }

    /// The cancellation token backing the queue's cooperative-stop signal.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.queue.cancellation_token()
    }
}

impl Clone for DeferredWorkQueue {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            started: self.started.clone(),
        }
    }
}

impl AsRef<WorkQueue> for DeferredWorkQueue {
    fn as_ref(&self) -> &WorkQueue {
        &self.queue
    }
}
