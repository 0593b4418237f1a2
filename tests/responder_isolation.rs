// tests/responder_isolation.rs

use std::sync::Arc;
use std::time::Duration;

use foundation::operation::{Operation, Parameters};
use foundation::types::ChangeKind;
use foundation::watch::{
    ChangeNotification, ChangeResponder, OperationResponder, ResponderDispatcher,
};
use foundation_test_utils::builders::notification;
use foundation_test_utils::responders::{
    FailingResponder, PanickingResponder, RecordingResponder, SlowResponder,
};
use foundation_test_utils::{init_tracing, with_timeout};

#[tokio::test]
async fn failing_responder_does_not_block_later_ones() {
    init_tracing();

    let failing = FailingResponder::new();
    let recorder = RecordingResponder::new();
    let dispatcher = ResponderDispatcher::new(
        vec![Arc::new(failing.clone()), Arc::new(recorder.clone())],
        None,
    );

    for name in ["a.txt", "b.txt", "c.txt"] {
        let report = with_timeout(dispatcher.dispatch(&notification("/proj", name, ChangeKind::Modify))).await;
        assert_eq!(report.failed, 1);
        assert_eq!(report.delivered, 1);
    }

    assert_eq!(failing.calls(), 3);
    assert_eq!(recorder.relative_paths(), ["a.txt", "b.txt", "c.txt"]);
}

#[tokio::test]
async fn panicking_responder_is_contained() {
    init_tracing();

    let recorder = RecordingResponder::new();
    let dispatcher = ResponderDispatcher::new(
        vec![Arc::new(PanickingResponder), Arc::new(recorder.clone())],
        None,
    );

    let report = with_timeout(dispatcher.dispatch(&notification("/proj", "a.txt", ChangeKind::Create))).await;
    assert_eq!(report.failed, 1);
    assert_eq!(recorder.count(), 1);
}

#[tokio::test]
async fn slow_responder_is_timed_out_and_delivery_continues() {
    init_tracing();

    let slow = SlowResponder::new(Duration::from_secs(60));
    let recorder = RecordingResponder::new();
    let dispatcher = ResponderDispatcher::new(
        vec![Arc::new(slow.clone()), Arc::new(recorder.clone())],
        Some(Duration::from_millis(50)),
    );

    let report = with_timeout(dispatcher.dispatch(&notification("/proj", "a.txt", ChangeKind::Modify))).await;
    assert_eq!(report.timed_out, 1);
    assert_eq!(report.delivered, 1);
    assert_eq!(slow.completed(), 0);
    assert_eq!(recorder.count(), 1);
}

#[tokio::test]
async fn responders_run_in_registration_order() {
    let first = RecordingResponder::new();
    let slow = SlowResponder::new(Duration::from_millis(30));
    let last = RecordingResponder::new();
    let dispatcher = ResponderDispatcher::new(
        vec![
            Arc::new(first.clone()),
            Arc::new(slow.clone()),
            Arc::new(last.clone()),
        ],
        Some(Duration::from_secs(1)),
    );

    with_timeout(dispatcher.dispatch(&notification("/proj", "a.txt", ChangeKind::Modify))).await;

    // The slow responder finished before the last one started.
    assert_eq!(slow.completed(), 1);
    assert_eq!(first.count(), 1);
    assert_eq!(last.count(), 1);
}

struct CountBytes;

impl Operation for CountBytes {
    type Input = String;
    type Output = usize;

    fn name(&self) -> &str {
        "count-bytes"
    }

    fn parameters(&self) -> Parameters {
        Parameters::new()
    }

    fn execute(&self, input: String) -> foundation::errors::Result<usize> {
        Ok(input.len())
    }
}

#[tokio::test]
async fn operation_responder_runs_the_operation() {
    let responder = OperationResponder::new(Arc::new(CountBytes), |n: &ChangeNotification| {
        n.relative_path.clone()
    });
    assert_eq!(responder.name(), "count-bytes");

    let n = notification("/proj", "src/main.rs", ChangeKind::Modify);
    with_timeout(responder.respond(&n)).await.unwrap();
}
