//! # Work Scheduling System
//!
//! This module provides the engine's work-execution machinery: a unit-of-work
//! abstraction, a bounded thread pool that runs submitted units, and ordered
//! queues that drain units one at a time while reporting progress, failure,
//! and completion to observers.
//!
//! ## Architecture Overview
//!
//! The scheduling system consists of several key components:
//! - `WorkItem`: A unit of work with a single execution entry point
//! - `ProgressMonitor`: The observer a work item reports to
//! - `ThreadPoolExecutor`: A bounded pool of worker threads
//! - `WorkQueue`: An ordered, drainable collection of pending work items
//! - `DeferredWorkQueue`: A queue whose drain is triggered by a later event
//! - `SourceSinkWorkItem`: A work item built from a producer/consumer pair
//!
//! ## Work Item Lifecycle
//! 1. Items are created and either added to a queue or submitted directly via
//!    `ThreadPoolExecutor::submit()`
//! 2. A worker thread picks the item up and calls `do_work()`
//! 3. The item periodically reports progress through its monitor; a `false`
//!    return asks it to stop as soon as practical
//! 4. The executor's error boundary converts the outcome into exactly one
//!    terminal callback: `work_complete` on success, `work_failed` on error
//! 5. A queue's internal wrapper monitor fans callbacks out to every
//!    registered observer and submits the next pending item
//!
//! ## Ordering Guarantees
//! - A single queue drains serially, so for a non-cancelled run terminal
//!   callbacks occur in the order items were added
//! - Across independent queues sharing one executor, no ordering is guaranteed
//!
//! ## Example Usage
//! ```rust
//! use std::sync::Arc;
//! use work_engine::scheduling::{generation, ThreadPoolExecutor, WorkQueue};
//!
//! let executor = Arc::new(ThreadPoolExecutor::new(2));
//! let queue = WorkQueue::new(executor);
//!
//! let (tx, rx) = std::sync::mpsc::channel();
//! generation::enqueue_generation(&queue, "noise tile", || vec![0u8; 16], move |tile| {
//!     let _ = tx.send(tile.len());
//! });
//!
//! queue.start();
//! assert_eq!(rx.recv().unwrap(), 16);
//! ```

pub mod deferred;
pub mod error;
pub mod executor;
pub mod generation;
pub mod monitor;
pub mod queue;
pub mod source_sink;
pub mod work_item;

pub use deferred::DeferredWorkQueue;
pub use error::{BuildError, SourceSinkError};
pub use executor::ThreadPoolExecutor;
pub use monitor::{CancelMonitor, CancellationToken, LogMonitor, NullMonitor, ProgressMonitor};
pub use queue::WorkQueue;
pub use source_sink::{SourceSinkBuilder, SourceSinkWorkItem};
pub use work_item::WorkItem;
