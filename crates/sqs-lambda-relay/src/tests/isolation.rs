//! V. Failure Isolation tests.
//!
//! Rules covered:
//! - 20. A failing function does not halt the relay
//! - 21. A healthy sibling mapping is unaffected by a failing one
//! - 22. A failing poll does not halt the reactor
//! - 23. A slow invocation does not block its batch siblings from settling
//! - 29. A crashed reactor fails the run instead of being reported as finished

use super::harness::{MockQueue, ObserverLog, TestHarness, BAD_FUNCTION, QUEUE_1, QUEUE_2};
use crate::config::MappingDescriptor;
use std::time::Duration;
use tokio::time::Instant;

/// Rule 20: A failing function does not halt the relay
#[tokio::test]
async fn rule_20_bad_function_does_not_halt() {
    let h = TestHarness::new();

    let result = h
        .relay
        .run(&[MappingDescriptor::new(QUEUE_1, BAD_FUNCTION).with_number_of_runs(2)])
        .await;

    let report = result.expect("Message failures must not fail the run");
    assert_eq!(h.lambda.invocation_count(), 0);
    assert_eq!(h.queue.poll_count(QUEUE_1), 2);
    assert_eq!(report.reactors[0].failed, 4);
}

/// Rule 21: A healthy sibling mapping is unaffected by a failing one
#[tokio::test]
async fn rule_21_sibling_mapping_unaffected() {
    let h = TestHarness::new();

    let report = h
        .relay
        .run(&[
            MappingDescriptor::new(QUEUE_1, BAD_FUNCTION).with_number_of_runs(3),
            MappingDescriptor::new(QUEUE_2, "boop")
                .with_number_of_runs(3)
                .with_delete_message(true),
        ])
        .await
        .unwrap();

    assert_eq!(h.lambda.count_for("boop"), 2, "Deleted after the first run");
    assert_eq!(h.queue.len(QUEUE_2), 0);
    assert_eq!(h.queue.len(QUEUE_1), 2);

    assert_eq!(report.reactors[0].failed, 6);
    assert_eq!(report.reactors[1].failed, 0);
    assert_eq!(report.reactors[1].succeeded, 2);
}

/// Rule 22: A failing poll does not halt the reactor
#[tokio::test]
async fn rule_22_poll_failure_counts_iteration() {
    let queue = MockQueue::with_default_messages();
    queue.fail_receives(QUEUE_1);
    let h = TestHarness::with_queue(queue);

    let report = h
        .relay
        .run(&[
            MappingDescriptor::new(QUEUE_1, "bar").with_number_of_runs(3),
            MappingDescriptor::new(QUEUE_2, "boop").with_number_of_runs(1),
        ])
        .await
        .unwrap();

    assert_eq!(report.reactors[0].iterations, 3);
    assert_eq!(report.reactors[0].poll_failures, 3);
    assert_eq!(report.reactors[0].received, 0);
    assert_eq!(h.lambda.count_for("bar"), 0);
    assert_eq!(h.lambda.count_for("boop"), 2);
}

/// Rule 23: A slow invocation does not block its batch siblings from settling
#[tokio::test(start_paused = true)]
async fn rule_23_batch_is_dispatched_concurrently() {
    let queue = MockQueue::new();
    for i in 0..3 {
        queue.send(QUEUE_1, &format!("body {i}"));
    }
    let h = TestHarness::with_queue(queue);
    for id in ["msg-1", "msg-2", "msg-3"] {
        h.lambda.delay_message(id, Duration::from_millis(100));
    }
    let log = ObserverLog::new();

    let start = Instant::now();
    h.relay
        .run(&[MappingDescriptor::new(QUEUE_1, "boop")
            .with_number_of_runs(1)
            .with_observer(log.observer())])
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(log.successes(), 3);
    assert!(
        elapsed < Duration::from_millis(200),
        "Three 100ms invocations should overlap, took {elapsed:?}"
    );
}

/// Rule 29: A crashed reactor fails the run instead of being reported as finished
#[tokio::test]
async fn rule_29_reactor_panic_is_not_swallowed() {
    let queue = MockQueue::with_default_messages();
    queue.panic_on_receive(QUEUE_1);
    let h = TestHarness::with_queue(queue);

    let relay = h.relay.clone();
    let handle = tokio::spawn(async move {
        relay
            .run(&[
                MappingDescriptor::new(QUEUE_1, "bar"),
                MappingDescriptor::new(QUEUE_2, "boop").with_number_of_runs(1),
            ])
            .await
    });

    let joined = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("A crashed reactor must not leave the run hanging");
    let err = joined.expect_err("A crashed reactor must not resolve the run");
    assert!(err.is_panic());
    assert_eq!(h.queue.poll_count(QUEUE_1), 1);
}
