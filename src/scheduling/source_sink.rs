//! # Source-Sink Work Item
//!
//! A generic work item built from a plain function pair: a producer
//! ("source") that computes a value, and a consumer ("sink") that receives
//! it. Construction goes through a validating builder; both functions are
//! mandatory, and the builder fails fast naming the missing field rather
//! than deferring the failure to execution time.
//!
//! Both functions run on whatever thread calls `do_work`, the sink
//! immediately after the source. No marshalling to any particular thread is
//! performed; a caller needing thread affinity must arrange it inside the
//! sink itself.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;

use anyhow::anyhow;
use log::debug;

use crate::scheduling::error::{BuildError, SourceSinkError};
use crate::scheduling::monitor::ProgressMonitor;
use crate::scheduling::work_item::WorkItem;

type Source<T> = Box<dyn FnOnce() -> T + Send>;
type Sink<T> = Box<dyn FnOnce(T) + Send>;
type FailureHook = Box<dyn Fn(&anyhow::Error) + Send + Sync>;

/// A work item composed of a producer function and a consumer function.
///
/// Executing the item invokes the source, reports terminal progress, and
/// invokes the sink with the produced value - all on the calling thread. A
/// panic from either function is converted into an ordinary work-item
/// failure. The item executes at most once; a second `do_work` call is an
/// error.
///
/// Built via [`SourceSinkBuilder`].
pub struct SourceSinkWorkItem<T> {
    name: String,
    /// Taken on first execution; `None` afterwards.
    parts: Mutex<Option<(Source<T>, Sink<T>)>>,
    on_failure: Option<FailureHook>,
}

impl<T: Send + 'static> SourceSinkWorkItem<T> {
    pub(crate) fn from_parts(name: &str, source: Source<T>, sink: Sink<T>) -> Self {
        Self {
            name: name.to_owned(),
            parts: Mutex::new(Some((source, sink))),
            on_failure: None,
        }
    }

    fn fail(&self, error: anyhow::Error) -> anyhow::Result<()> {
        if let Some(hook) = &self.on_failure {
            hook(&error);
        }
        Err(error)
    }
}

impl<T: Send + 'static> WorkItem for SourceSinkWorkItem<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn do_work(&self, monitor: &dyn ProgressMonitor) -> anyhow::Result<()> {
        let Some((source, sink)) = self.parts.lock().unwrap().take() else {
            return self.fail(
                SourceSinkError::AlreadyExecuted {
                    name: self.name.clone(),
                }
                .into(),
            );
        };

        if !monitor.update_progress(self, 0.0) {
            debug!("`{}` observed cancellation before its source ran", self.name);
            return Ok(());
        }

        let value = match panic::catch_unwind(AssertUnwindSafe(|| source())) {
            Ok(value) => value,
            Err(_) => {
                return self.fail(anyhow!("source function of `{}` panicked", self.name));
            }
        };

        if !monitor.update_progress(self, 1.0) {
            debug!("`{}` observed cancellation before its sink ran", self.name);
            return Ok(());
        }

        match panic::catch_unwind(AssertUnwindSafe(|| sink(value))) {
            Ok(()) => Ok(()),
            Err(_) => self.fail(anyhow!("sink function of `{}` panicked", self.name)),
        }
    }
}

/// Validating builder for [`SourceSinkWorkItem`].
///
/// The source and sink are mandatory and modelled as explicit unset
/// sentinels checked once at [`build`](SourceSinkBuilder::build); the
/// failure callback is optional.
///
/// # Examples
/// ```
/// use work_engine::SourceSinkBuilder;
///
/// let missing = SourceSinkBuilder::<u32>::new().source(|| 10).build("half built");
/// assert!(missing.is_err());
///
/// let item = SourceSinkBuilder::new()
///     .source(|| 10)
///     .sink(|value| assert_eq!(value, 10))
///     .build("fully built");
/// assert!(item.is_ok());
/// ```
pub struct SourceSinkBuilder<T> {
    source: Option<Source<T>>,
    sink: Option<Sink<T>>,
    on_failure: Option<FailureHook>,
}

impl<T: Send + 'static> SourceSinkBuilder<T> {
    /// Creates a builder with no fields set.
    pub fn new() -> Self {
        Self {
            source: None,
            sink: None,
            on_failure: None,
        }
    }

    /// Sets the producer function. Mandatory.
    pub fn source<F>(mut self, source: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Sets the consumer function. Mandatory.
    ///
    /// Invoked with the produced value on the same thread as the source; no
    /// marshalling to any particular thread is performed.
    pub fn sink<F>(mut self, sink: F) -> Self
    where
        F: FnOnce(T) + Send + 'static,
    {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Sets an optional callback invoked when the built item fails, in
    /// addition to the monitor's `work_failed` fan-out.
    pub fn on_failure<F>(mut self, on_failure: F) -> Self
    where
        F: Fn(&anyhow::Error) + Send + Sync + 'static,
    {
        self.on_failure = Some(Box::new(on_failure));
        self
    }

    /// Builds the work item named `name`.
    ///
    /// # Errors
    /// Fails immediately with a [`BuildError`] naming the missing field if
    /// either the source or the sink has not been set.
    pub fn build(self, name: &str) -> Result<SourceSinkWorkItem<T>, BuildError> {
        let Some(source) = self.source else {
            return Err(BuildError::MissingSource {
                name: name.to_owned(),
            });
        };
        let Some(sink) = self.sink else {
            return Err(BuildError::MissingSink {
                name: name.to_owned(),
            });
        };
        Ok(SourceSinkWorkItem {
            name: name.to_owned(),
            parts: Mutex::new(Some((source, sink))),
            on_failure: self.on_failure,
        })
    }
}

impl<T: Send + 'static> Default for SourceSinkBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::monitor::{CancelMonitor, CancellationToken, NullMonitor};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn build_without_source_fails_fast() {
        let result = SourceSinkBuilder::<u32>::new()
            .sink(|_| {})
            .build("no source");
        let error = result.err().unwrap();
        assert!(matches!(error, BuildError::MissingSource { .. }));
        assert!(error.to_string().contains("source"));
    }

    #[test]
    fn build_without_sink_fails_fast() {
        let result = SourceSinkBuilder::new().source(|| 10).build("no sink");
        let error = result.err().unwrap();
        assert!(matches!(error, BuildError::MissingSink { .. }));
        assert!(error.to_string().contains("sink"));
    }

    #[test]
    fn sink_receives_the_produced_value_exactly_once() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let counter = invocations.clone();
        let item = SourceSinkBuilder::new()
            .source(|| 10)
            .sink(move |value| {
                assert_eq!(value, 10);
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build("ten")
            .unwrap();

        item.do_work(&NullMonitor).unwrap();
        assert_eq!(invocations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn second_execution_is_an_error() {
        let item = SourceSinkBuilder::new()
            .source(|| ())
            .sink(|_| {})
            .build("once only")
            .unwrap();
        item.do_work(&NullMonitor).unwrap();

        let error = item.do_work(&NullMonitor).err().unwrap();
        let source_sink_error = error.downcast_ref::<SourceSinkError>().unwrap();
        assert!(matches!(
            source_sink_error,
            SourceSinkError::AlreadyExecuted { .. }
        ));
    }

    #[test]
    fn cancellation_before_the_source_skips_both_functions() {
        let token = CancellationToken::new();
        token.cancel();
        let monitor = CancelMonitor::new(token);

        let item = SourceSinkBuilder::new()
            .source(|| panic!("source must not run"))
            .sink(|_: ()| panic!("sink must not run"))
            .build("cancelled early")
            .unwrap();
        item.do_work(&monitor).unwrap();
    }

    #[test]
    fn panicking_source_becomes_a_failure_and_fires_the_hook() {
        let hook_calls = Arc::new(AtomicUsize::new(0));
        let counter = hook_calls.clone();
        let item = SourceSinkBuilder::<u32>::new()
            .source(|| panic!("no value today"))
            .sink(|_| {})
            .on_failure(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build("doomed")
            .unwrap();

        let error = item.do_work(&NullMonitor).err().unwrap();
        assert!(error.to_string().contains("source function"));
        assert_eq!(hook_calls.load(Ordering::SeqCst), 1);
    }
}
