//! Shared scaffolding for the integration tests: a recording monitor that
//! captures the callback stream and queue-count snapshots, plus small wait
//! helpers for cross-thread assertions.

#![allow(dead_code)]

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use work_engine::{ProgressMonitor, WorkItem, WorkQueue};

/// How long a test is willing to wait for background work before failing.
pub const WAIT_LIMIT: Duration = Duration::from_secs(5);

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One observed monitor callback.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Progress {
        item: String,
    },
    Complete {
        item: String,
        /// Queue count read inside the callback.
        remaining: usize,
    },
    Failed {
        item: String,
        error: String,
        /// Queue count read inside the callback.
        remaining: usize,
    },
}

/// A monitor that records every callback and snapshots the queue count
/// inside each terminal callback, the way a splash screen would to decide
/// when to close.
pub struct Recorder {
    queue: WorkQueue,
    events: Mutex<Vec<Event>>,
    drained: (Mutex<bool>, Condvar),
}

impl Recorder {
    pub fn new(queue: WorkQueue) -> Arc<Self> {
        Arc::new(Self {
            queue,
            events: Mutex::new(Vec::new()),
            drained: (Mutex::new(false), Condvar::new()),
        })
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Terminal callbacks only, in observation order.
    pub fn terminal_events(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|event| !matches!(event, Event::Progress { .. }))
            .collect()
    }

    /// Blocks until a terminal callback has observed a queue count of 0.
    ///
    /// # Panics
    /// Panics if the queue has not drained within `timeout`.
    pub fn wait_for_drain(&self, timeout: Duration) {
        let (lock, cvar) = &self.drained;
        let deadline = Instant::now() + timeout;
        let mut done = lock.lock().unwrap();
        while !*done {
            let remaining = deadline.saturating_duration_since(Instant::now());
            assert!(!remaining.is_zero(), "timed out waiting for queue drain");
            done = cvar.wait_timeout(done, remaining).unwrap().0;
        }
    }

    fn record_terminal(&self, event: Event, remaining: usize) {
        self.events.lock().unwrap().push(event);
        if remaining == 0 {
            let (lock, cvar) = &self.drained;
            *lock.lock().unwrap() = true;
            cvar.notify_all();
        }
    }
}

impl ProgressMonitor for Recorder {
    fn update_progress(&self, item: &dyn WorkItem, _progress: f32) -> bool {
        self.events.lock().unwrap().push(Event::Progress {
            item: item.name().to_owned(),
        });
        true
    }

    fn work_failed(&self, item: &dyn WorkItem, error: &anyhow::Error) {
        let remaining = self.queue.number_of_work_items_in_queue();
        self.record_terminal(
            Event::Failed {
                item: item.name().to_owned(),
                error: format!("{error:#}"),
                remaining,
            },
            remaining,
        );
    }

    fn work_complete(&self, item: &dyn WorkItem) {
        let remaining = self.queue.number_of_work_items_in_queue();
        self.record_terminal(
            Event::Complete {
                item: item.name().to_owned(),
                remaining,
            },
            remaining,
        );
    }
}

/// Polls `predicate` until it holds or `timeout` elapses.
///
/// # Panics
/// Panics on timeout.
pub fn wait_until(timeout: Duration, predicate: impl Fn() -> bool) {
    let deadline = Instant::now() + timeout;
    while !predicate() {
        assert!(
            Instant::now() < deadline,
            "timed out waiting for condition"
        );
        std::thread::sleep(Duration::from_millis(2));
    }
}
