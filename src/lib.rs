#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Work Engine
//!
//! A deferred, thread-pool-backed work-execution engine.
//!
//! This crate provides the machinery for running units of work off the main
//! thread and delivering their outcomes back through an observer protocol.
//! It was built for hosts that need to push expensive computation (procedural
//! texture generation, terrain builds, startup initialization batches) onto
//! background workers while a UI surface tracks progress.
//!
//! ## Key Modules
//!
//! * `core` - Shared-state primitives used throughout the engine
//! * `scheduling` - Work items, monitors, the thread pool executor, and the
//!   ordered work queues built on top of it
//!
//! ## Architecture
//!
//! The engine follows a small, layered architecture:
//! * [`WorkItem`] is the unit-of-work contract
//! * [`ProgressMonitor`] is the observer contract a work item reports to
//! * [`ThreadPoolExecutor`] runs submitted items on a bounded set of worker
//!   threads and converts failures into monitor callbacks
//! * [`WorkQueue`] drains an ordered batch of items serially, fanning
//!   progress, failure, and completion out to every registered monitor
//! * [`DeferredWorkQueue`] is a single-use queue for the "collect work up
//!   front, run it when some event fires" pattern
//! * [`SourceSinkWorkItem`] adapts a plain producer/consumer function pair
//!   into a schedulable work item
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use work_engine::{DeferredWorkQueue, SourceSinkBuilder, ThreadPoolExecutor};
//!
//! let executor = Arc::new(ThreadPoolExecutor::new(2));
//! let queue = DeferredWorkQueue::new(executor);
//!
//! let (tx, rx) = std::sync::mpsc::channel();
//! let item = SourceSinkBuilder::new()
//!     .source(|| 6 * 7)
//!     .sink(move |value| {
//!         let _ = tx.send(value);
//!     })
//!     .build("answer")
//!     .unwrap();
//! queue.add(Arc::new(item));
//!
//! // Some later event (a splash screen becoming visible, say) triggers the
//! // drain; the batch was fully populated before it started.
//! queue.start();
//! assert_eq!(rx.recv().unwrap(), 42);
//! ```
//!
//! ## Concurrency Model
//!
//! A shared pool of worker threads services every queue in the process.
//! `do_work` may block its worker for its full duration, so pool sizing must
//! account for the expected blocking time of submitted items. Cancellation is
//! cooperative only: a `false` return from `update_progress` is advisory, and
//! a non-cooperating item runs to completion regardless.

pub mod core;
pub mod scheduling;

pub use scheduling::deferred::DeferredWorkQueue;
pub use scheduling::error::{BuildError, SourceSinkError};
pub use scheduling::executor::ThreadPoolExecutor;
pub use scheduling::monitor::{
    CancelMonitor, CancellationToken, LogMonitor, NullMonitor, ProgressMonitor,
};
pub use scheduling::queue::WorkQueue;
pub use scheduling::source_sink::{SourceSinkBuilder, SourceSinkWorkItem};
pub use scheduling::work_item::WorkItem;
