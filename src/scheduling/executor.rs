//! # Thread Pool Executor
//!
//! A bounded pool of worker threads that runs submitted work items without
//! ever blocking the submitter.
//!
//! ## Architecture
//!
//! Submissions land in a locked FIFO guarded by a condition variable; each
//! worker thread loops popping the next submission and running it inside an
//! error boundary. Anything escaping `do_work` - an `Err` return or a panic -
//! is converted into a `work_failed` callback on the submission's monitor. A
//! worker thread never dies because an item failed, and no more items run
//! concurrently than there are workers.
//!
//! The executor provides no ordering guarantee across items submitted from
//! different queues; ordering within a single queue is the queue's
//! responsibility (see [`WorkQueue`](crate::WorkQueue)).
//!
//! ## Instances
//!
//! Prefer constructing an explicit executor and handing it to every queue
//! that needs one; tests stay deterministic and there is no hidden process
//! state. A lazily-created process-wide instance remains available through
//! [`ThreadPoolExecutor::shared`] for hosts that want the convenience.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::thread::{self, JoinHandle};

use anyhow::anyhow;
use log::{debug, error, info};

use crate::scheduling::monitor::{NullMonitor, ProgressMonitor};
use crate::scheduling::source_sink::SourceSinkWorkItem;
use crate::scheduling::work_item::WorkItem;

/// Worker count used when the platform will not report its available
/// parallelism.
pub const FALLBACK_WORKER_COUNT: usize = 2;

/// A work item paired with the monitor its outcome is delivered to.
struct Submission {
    item: Arc<dyn WorkItem>,
    monitor: Arc<dyn ProgressMonitor>,
}

/// State shared between the executor handle and its worker threads.
struct PoolShared {
    pending: Mutex<VecDeque<Submission>>,
    work_available: Condvar,
    shutdown: AtomicBool,
    in_use: AtomicUsize,
}

/// A bounded set of worker threads that executes submitted work items.
///
/// # Invariants
/// - Never executes more concurrent units of work than its worker count
/// - Never blocks the submitting thread
/// - Exactly one worker ever runs a given submission
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use work_engine::ThreadPoolExecutor;
///
/// let executor = Arc::new(ThreadPoolExecutor::new(2));
/// let (tx, rx) = std::sync::mpsc::channel();
/// executor.submit_fn("warm caches", move || {
///     let _ = tx.send(());
/// });
/// rx.recv().unwrap();
/// ```
pub struct ThreadPoolExecutor {
    shared: Arc<PoolShared>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPoolExecutor {
    /// Creates an executor with `num_workers` worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to create; must be at
    ///   least 1. Size for the expected blocking time of submitted items:
    ///   `do_work` may hold a worker for its full duration.
    ///
    /// # Panics
    /// Panics if `num_workers` is 0 or the platform refuses to spawn a
    /// thread.
    pub fn new(num_workers: usize) -> Self {
        assert!(num_workers > 0, "executor needs at least one worker");

        let shared = Arc::new(PoolShared {
            pending: Mutex::new(VecDeque::new()),
            work_available: Condvar::new(),
            shutdown: AtomicBool::new(false),
            in_use: AtomicUsize::new(0),
        });

        let workers = (0..num_workers)
            .map(|index| {
                let shared = shared.clone();
                thread::Builder::new()
                    .name(format!("work-engine-worker-{index}"))
                    .spawn(move || worker_loop(shared, index))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        debug!("thread pool executor started with {num_workers} workers");
        Self { shared, workers }
    }

    /// Creates an executor sized from the host's available parallelism.
    ///
    /// Falls back to [`FALLBACK_WORKER_COUNT`] workers when the platform
    /// cannot report a count.
    pub fn with_default_workers() -> Self {
        let num_workers = thread::available_parallelism()
            .map(|count| count.get())
            .unwrap_or(FALLBACK_WORKER_COUNT);
        info!("available parallelism: {num_workers}");
        Self::new(num_workers)
    }

    /// Returns the lazily-created process-wide executor.
    ///
    /// Queues that want isolation from unrelated subsystems should construct
    /// their own instance instead; sharing one pool means sharing its
    /// workers' availability.
    pub fn shared() -> Arc<ThreadPoolExecutor> {
        static SHARED: OnceLock<Arc<ThreadPoolExecutor>> = OnceLock::new();
        SHARED
            .get_or_init(|| Arc::new(ThreadPoolExecutor::with_default_workers()))
            .clone()
    }

    /// Enqueues `item` for execution on the next free worker and returns
    /// immediately.
    ///
    /// The item's outcome is delivered to `monitor`: `work_complete` on
    /// success, `work_failed` if `do_work` returned an error or panicked.
    /// Nothing propagates back to the submitting thread.
    pub fn submit(&self, item: Arc<dyn WorkItem>, monitor: Arc<dyn ProgressMonitor>) {
        debug!("submitting work item `{}`", item.name());
        let mut pending = self.shared.pending.lock().unwrap();
        pending.push_back(Submission { item, monitor });
        drop(pending);
        self.shared.work_available.notify_one();
    }

    /// Convenience wrapper that submits a bare closure as a work item with a
    /// [`NullMonitor`].
    pub fn submit_fn<F>(&self, name: &str, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let item = SourceSinkWorkItem::from_parts(name, Box::new(work), Box::new(|_: ()| {}));
        self.submit(Arc::new(item), Arc::new(NullMonitor));
    }

    /// Number of worker threads in the pool.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Number of workers currently running a work item.
    pub fn active_workers(&self) -> usize {
        self.shared.in_use.load(Ordering::Acquire)
    }

    /// Number of submissions waiting for a free worker.
    pub fn pending_items(&self) -> usize {
        self.shared.pending.lock().unwrap().len()
    }

    /// Discards every submission not yet picked up by a worker.
    ///
    /// Items already running are unaffected. Discarded submissions receive no
    /// callbacks.
    ///
    /// # Returns
    /// The number of submissions discarded.
    pub fn clear_pending(&self) -> usize {
        let mut pending = self.shared.pending.lock().unwrap();
        let discarded = pending.len();
        pending.clear();
        if discarded > 0 {
            debug!("cleared {discarded} pending submissions");
        }
        discarded
    }
}

impl Drop for ThreadPoolExecutor {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        // Pending submissions are discarded; workers finish their current
        // item and exit.
        self.shared.pending.lock().unwrap().clear();
        self.shared.work_available.notify_all();
        let current = thread::current().id();
        for handle in self.workers.drain(..) {
            if handle.thread().id() != current {
                let _ = handle.join();
            }
        }
    }
}

/// Main loop of a single worker thread.
fn worker_loop(shared: Arc<PoolShared>, index: usize) {
    debug!("worker {index} started");
    loop {
        let submission = {
            let mut pending = shared.pending.lock().unwrap();
            loop {
                if let Some(submission) = pending.pop_front() {
                    break submission;
                }
                if shared.shutdown.load(Ordering::Acquire) {
                    debug!("worker {index} shutting down");
                    return;
                }
                pending = shared.work_available.wait(pending).unwrap();
            }
        };

        shared.in_use.fetch_add(1, Ordering::AcqRel);
        run_item(&submission);
        shared.in_use.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Runs one submission inside the executor's error boundary.
///
/// This is the single place where an item's failure is converted into a
/// typed callback instead of being allowed to propagate: an `Err` return or
/// a panic from `do_work` both become `work_failed` on the submission's
/// monitor, and a successful return becomes `work_complete`.
fn run_item(submission: &Submission) {
    let item = &submission.item;
    let monitor = &submission.monitor;
    debug!("running work item `{}`", item.name());

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| item.do_work(monitor.as_ref())));
    let result = match outcome {
        Ok(result) => result,
        Err(payload) => Err(anyhow!(
            "work item `{}` panicked: {}",
            item.name(),
            panic_message(payload.as_ref())
        )),
    };

    // Terminal delivery runs outside the item boundary; a misbehaving
    // monitor must not take the worker thread down either.
    let delivered = panic::catch_unwind(AssertUnwindSafe(|| match &result {
        Ok(()) => monitor.work_complete(item.as_ref()),
        Err(failure) => {
            error!("work item `{}` failed: {failure:#}", item.name());
            monitor.work_failed(item.as_ref(), failure);
        }
    }));
    if delivered.is_err() {
        error!(
            "monitor panicked while handling outcome of `{}`",
            item.name()
        );
    }
}

/// Best-effort extraction of a panic payload's message.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic payload>"
    }
}
