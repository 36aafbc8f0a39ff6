//! Typed errors for the scheduling system.
//!
//! Configuration errors (a builder invoked with a missing mandatory field)
//! are fatal and detected synchronously at build time, never silently
//! defaulted. Execution failures inside a unit of work are *not* represented
//! here; they travel as `anyhow::Error` through the monitor callback
//! protocol.

use thiserror::Error;

/// A builder was asked to produce a work item before all mandatory fields
/// were set.
#[derive(Debug, Error)]
pub enum BuildError {
    /// No source (producer) function was set.
    #[error("work item `{name}` is missing its source function")]
    MissingSource {
        /// Name the item was being built under.
        name: String,
    },

    /// No sink (consumer) function was set.
    #[error("work item `{name}` is missing its sink function")]
    MissingSink {
        /// Name the item was being built under.
        name: String,
    },
}

/// Errors a [`SourceSinkWorkItem`](crate::SourceSinkWorkItem) can raise at
/// execution time.
#[derive(Debug, Error)]
pub enum SourceSinkError {
    /// `do_work` was invoked on an item that has already executed. A work
    /// item instance runs at most once.
    #[error("work item `{name}` has already executed")]
    AlreadyExecuted {
        /// Name of the offending item.
        name: String,
    },
}
