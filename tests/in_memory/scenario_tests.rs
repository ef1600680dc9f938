//! One invocation per task outcome, driven through the public API.

use std::sync::Arc;

use genqueue::queue::{
    adapters::memory::RecordingContinuation,
    domain::{
        ContinuationDecision, FailureDisposition, QueueDepth, TaskOutcome, TaskStatus,
    },
    ports::TaskStore,
    services::{EntryPointError, ProcessInvocation},
};
use rstest::{fixture, rstest};
use serde_json::json;

use crate::test_helpers::{OUTPUT_URL, PNG_BYTES, POLL_ATTEMPTS, QueueRig, STORAGE_BASE};

#[fixture]
fn rig() -> QueueRig {
    QueueRig::new()
}

#[rstest]
#[tokio::test]
async fn pending_task_completes_when_success_flag_arrives_on_second_check(rig: QueueRig) {
    let id = rig.enqueue("Harbour Run").await;
    rig.enqueue("Hill Sprint").await;
    rig.script_success_on_second_check("job-1");
    let scheduler = RecordingContinuation::new();

    let report = rig
        .entry_point(Arc::new(scheduler.clone()))
        .invoke(QueueDepth::ROOT)
        .await
        .expect("invocation should succeed");

    let TaskOutcome::Completed { task_id, reference, .. } = &report.outcome else {
        panic!("expected completion, got {:?}", report.outcome);
    };
    assert_eq!(*task_id, id);
    assert!(reference.starts_with(&format!("{STORAGE_BASE}/events/Harbour_Run/")));
    assert_eq!(rig.api.status_checks(), 2);

    let task = rig.task(id).await;
    assert_eq!(task.status(), TaskStatus::Completed);
    assert!(task.artifact_generated());
    assert_eq!(task.result_reference(), Some(reference.as_str()));
    assert_eq!(report.remaining(), Some(1));

    let stored_path = reference
        .strip_prefix(&format!("{STORAGE_BASE}/"))
        .expect("reference under storage base");
    let stored = rig.storage.object(stored_path).expect("artifact stored");
    assert_eq!(stored.bytes, PNG_BYTES);
}

#[rstest]
#[tokio::test]
async fn task_on_its_last_attempt_fails_permanently(rig: QueueRig) {
    let id = rig.insert(2, "Lake Swim", TaskStatus::Failed, 2, None).await;

    let outcome = rig
        .processor()
        .process_next()
        .await
        .expect("processing should run");

    assert!(matches!(
        outcome,
        TaskOutcome::Failed {
            retry_count: 3,
            disposition: FailureDisposition::Permanent,
            ..
        }
    ));
    let task = rig.task(id).await;
    assert_eq!(task.status(), TaskStatus::PermanentlyFailed);
    assert_eq!(task.retry_count(), 3);
    assert!(task.error_message().is_some_and(|message| message.starts_with("Failed: ")));
    assert!(
        rig.store
            .select_next_eligible(rig.policy)
            .await
            .expect("selection should succeed")
            .is_none()
    );
}

#[rstest]
#[tokio::test]
async fn repeated_failures_end_in_permanent_failure(rig: QueueRig) {
    let id = rig.enqueue("Fell Race").await;
    let processor = rig.processor();
    let mut observed = Vec::new();

    for _ in 0..3 {
        processor.process_next().await.expect("processing should run");
        let task = rig.task(id).await;
        observed.push((task.status(), task.retry_count()));
    }
    let after_exhaustion = processor.process_next().await.expect("processing should run");

    assert_eq!(
        observed,
        vec![
            (TaskStatus::Failed, 1),
            (TaskStatus::Failed, 2),
            (TaskStatus::PermanentlyFailed, 3),
        ]
    );
    assert_eq!(after_exhaustion, TaskOutcome::QueueEmpty);
    assert_eq!(rig.api.submitted().len(), 3);
}

#[rstest]
#[tokio::test]
async fn empty_queue_reports_without_continuing(rig: QueueRig) {
    let scheduler = RecordingContinuation::new();

    let report = rig
        .entry_point(Arc::new(scheduler.clone()))
        .invoke(QueueDepth::ROOT)
        .await
        .expect("invocation should succeed");

    assert_eq!(report.outcome, TaskOutcome::QueueEmpty);
    assert_eq!(report.continuation, ContinuationDecision::NotAttempted);
    assert!(scheduler.requested().is_empty());
}

#[rstest]
#[tokio::test]
async fn invocation_at_depth_limit_touches_nothing(rig: QueueRig) {
    let id = rig.enqueue("Harbour Run").await;
    rig.script_success("job-1");
    let scheduler = RecordingContinuation::new();

    let result = rig
        .entry_point(Arc::new(scheduler.clone()))
        .invoke(rig.max_depth)
        .await;

    assert!(matches!(
        result,
        Err(EntryPointError::DepthLimitExceeded { depth, .. }) if depth == rig.max_depth
    ));
    assert_eq!(rig.task(id).await.status(), TaskStatus::Pending);
    assert!(rig.api.submitted().is_empty());
    assert!(scheduler.requested().is_empty());
}

#[rstest]
#[tokio::test]
async fn job_that_never_finishes_times_out_after_the_poll_budget(rig: QueueRig) {
    let id = rig.enqueue("Night Trail").await;
    rig.api.push_job("job-slow");

    let outcome = rig
        .processor()
        .process_next()
        .await
        .expect("processing should run");

    let TaskOutcome::Failed { message, disposition, .. } = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(disposition, FailureDisposition::Retryable);
    assert!(message.contains(&format!("timed out after {POLL_ATTEMPTS} status checks")));
    assert_eq!(rig.api.status_checks(), POLL_ATTEMPTS);
    assert_eq!(rig.task(id).await.status(), TaskStatus::Failed);
}

#[rstest]
#[case::terminal_failure(json!({"status": 3}), "failed with status 3")]
#[case::success_without_output(json!({"status": 1}), "no output found")]
#[case::output_not_downloadable(
    json!({"status": 1, "resultImageUrl": "https://cdn.test/missing.png"}),
    "returned HTTP 404"
)]
#[tokio::test]
async fn generation_and_storage_failures_are_retryable(
    rig: QueueRig,
    #[case] status: serde_json::Value,
    #[case] expected: &str,
) {
    let id = rig.enqueue("Ridge Run").await;
    rig.api.push_job("job-1");
    rig.api.push_status_data(status);

    rig.processor()
        .process_next()
        .await
        .expect("processing should run");

    let task = rig.task(id).await;
    assert_eq!(task.status(), TaskStatus::Failed);
    assert_eq!(task.retry_count(), 1);
    assert!(task.generation_prompt().is_some());
    let message = task.error_message().expect("failure recorded");
    assert!(message.starts_with("Retrying: "), "unexpected message {message}");
    assert!(message.contains(expected), "unexpected message {message}");
}

#[rstest]
#[tokio::test]
async fn output_nested_in_encoded_response_is_materialized(rig: QueueRig) {
    let id = rig.enqueue("Harbour Run").await;
    rig.api.push_job("job-1");
    rig.api.push_status_data(json!({
        "successFlag": 1,
        "response": serde_json::to_string(&json!({"images": [OUTPUT_URL]}))
            .expect("encode response"),
    }));

    rig.processor()
        .process_next()
        .await
        .expect("processing should run");

    assert_eq!(rig.task(id).await.status(), TaskStatus::Completed);
}
