//! # Background-Generation Helpers
//!
//! Convenience operations for the engine's background-generation consumers
//! (procedural texture builders, terrain generators): package "generate a
//! resource, then hand it to a callback" as a single schedulable work item.
//!
//! The producer runs on a worker thread and the callback runs immediately
//! after it, on the same thread. A callback needing thread affinity (for
//! example, uploading to a renderer that is main-thread-only) must arrange
//! the hand-off itself.

use std::sync::Arc;

use crate::scheduling::executor::ThreadPoolExecutor;
use crate::scheduling::monitor::NullMonitor;
use crate::scheduling::queue::WorkQueue;
use crate::scheduling::source_sink::SourceSinkWorkItem;

/// Adds a "produce, then consume" item to `queue`.
///
/// Accepts anything that can stand in for a [`WorkQueue`], including a
/// [`DeferredWorkQueue`](crate::DeferredWorkQueue).
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use work_engine::{scheduling::generation, ThreadPoolExecutor, WorkQueue};
///
/// let queue = WorkQueue::new(Arc::new(ThreadPoolExecutor::new(1)));
/// let (tx, rx) = std::sync::mpsc::channel();
/// generation::enqueue_generation(&queue, "cloud texture", || vec![0u8; 256], move |texture| {
///     let _ = tx.send(texture);
/// });
/// queue.start();
/// assert_eq!(rx.recv().unwrap().len(), 256);
/// ```
pub fn enqueue_generation<Q, T, S, K>(queue: &Q, name: &str, source: S, sink: K)
where
    Q: AsRef<WorkQueue>,
    T: Send + 'static,
    S: FnOnce() -> T + Send + 'static,
    K: FnOnce(T) + Send + 'static,
{
    let item = SourceSinkWorkItem::from_parts(name, Box::new(source), Box::new(sink));
    queue.as_ref().add(Arc::new(item));
}

/// Submits a "produce, then consume" item directly to `executor`, bypassing
/// any queue ordering.
///
/// Suited to one-off generation work with no batch semantics; the item runs
/// as soon as a worker is free, with a [`NullMonitor`] observing it.
pub fn spawn_generation<T, S, K>(executor: &ThreadPoolExecutor, name: &str, source: S, sink: K)
where
    T: Send + 'static,
    S: FnOnce() -> T + Send + 'static,
    K: FnOnce(T) + Send + 'static,
{
    let item = SourceSinkWorkItem::from_parts(name, Box::new(source), Box::new(sink));
    executor.submit(Arc::new(item), Arc::new(NullMonitor));
}
