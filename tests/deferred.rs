//! The gather-now-run-later pattern: a deferred batch only drains once its
//! triggering event fires, and it fires at most once.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{Recorder, WAIT_LIMIT};
use work_engine::{scheduling::generation, DeferredWorkQueue, SourceSinkBuilder, ThreadPoolExecutor};

#[test]
fn nothing_runs_until_the_trigger_event_starts_the_batch() {
    common::init_logging();
    let executor = Arc::new(ThreadPoolExecutor::new(2));
    let queue = DeferredWorkQueue::new(executor);
    let recorder = Recorder::new(queue.as_ref().clone());
    queue.add_monitor(recorder.clone());

    let generated = Arc::new(AtomicUsize::new(0));
    for name in ["splash texture", "base terrain", "sky gradient"] {
        let generated = generated.clone();
        queue.add(Arc::new(
            SourceSinkBuilder::new()
                .source(|| ())
                .sink(move |_| {
                    generated.fetch_add(1, Ordering::SeqCst);
                })
                .build(name)
                .unwrap(),
        ));
    }

    // Fully populated, not yet draining.
    assert_eq!(queue.number_of_work_items_in_queue(), 3);
    assert_eq!(generated.load(Ordering::SeqCst), 0);

    // The UI becomes visible.
    queue.start();
    recorder.wait_for_drain(WAIT_LIMIT);

    assert_eq!(generated.load(Ordering::SeqCst), 3);
    assert_eq!(queue.number_of_work_items_in_queue(), 0);
}

#[test]
fn generation_helpers_feed_a_deferred_batch() {
    common::init_logging();
    let executor = Arc::new(ThreadPoolExecutor::new(2));
    let queue = DeferredWorkQueue::new(executor);
    let recorder = Recorder::new(queue.as_ref().clone());
    queue.add_monitor(recorder.clone());

    let (tx, rx) = std::sync::mpsc::channel();
    generation::enqueue_generation(&queue, "noise field", || vec![7u8; 32], move |field| {
        let _ = tx.send(field);
    });

    queue.start();
    recorder.wait_for_drain(WAIT_LIMIT);
    assert_eq!(rx.recv().unwrap(), vec![7u8; 32]);
}

#[test]
#[should_panic(expected = "single-use")]
fn starting_a_deferred_batch_twice_is_a_programming_error() {
    common::init_logging();
    let executor = Arc::new(ThreadPoolExecutor::new(1));
    let queue = DeferredWorkQueue::new(executor);
    queue.start();
    queue.start();
}
