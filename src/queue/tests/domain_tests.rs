//! Domain tests for eligibility, claims and attempt accounting.

use rstest::rstest;

use super::harness::{pending, task_id};
use crate::queue::domain::{
    FailureDisposition, FailureRecord, GenerationTask, PersistedTaskData, QueueDepth,
    QueueDomainError, RetryPolicy, TaskOutcome, TaskPayload, TaskStatus,
};
use crate::test_support::FixedClock;

fn persisted(status: TaskStatus, retry_count: u32) -> GenerationTask {
    GenerationTask::from_persisted(PersistedTaskData {
        id: task_id(9),
        status,
        retry_count,
        error_message: Some("Retrying: earlier failure".to_owned()),
        generation_started_at: None,
        generation_prompt: None,
        result_reference: None,
        artifact_generated: false,
        payload: TaskPayload::new(),
    })
}

#[rstest]
#[case(TaskStatus::Pending, 0, true)]
#[case(TaskStatus::Failed, 1, true)]
#[case(TaskStatus::Failed, 2, true)]
#[case(TaskStatus::Failed, 3, false)]
#[case(TaskStatus::Processing, 1, false)]
#[case(TaskStatus::Completed, 1, false)]
#[case(TaskStatus::PermanentlyFailed, 3, false)]
fn eligibility_follows_status_and_retry_budget(
    #[case] status: TaskStatus,
    #[case] retry_count: u32,
    #[case] expected: bool,
) {
    let task = persisted(status, retry_count);

    assert_eq!(task.is_eligible(RetryPolicy::default()), expected);
}

#[rstest]
fn first_claim_keeps_retry_count_and_clears_error() {
    let clock = FixedClock::reference();
    let mut task = pending(1, "Harbour Run");

    let claim = task
        .prepare_claim(RetryPolicy::default(), &clock)
        .expect("pending task is claimable");
    task.apply_claim(&claim);

    assert_eq!(claim.attempt(), 1);
    assert_eq!(task.retry_count(), 0);
    assert_eq!(task.status(), TaskStatus::Processing);
    assert_eq!(task.generation_started_at(), Some(clock.0));
}

#[rstest]
fn retry_claim_increments_retry_count() {
    let clock = FixedClock::reference();
    let mut task = persisted(TaskStatus::Failed, 1);

    let claim = task
        .prepare_claim(RetryPolicy::default(), &clock)
        .expect("retryable task is claimable");
    task.apply_claim(&claim);

    assert_eq!(claim.expected_retry_count(), 1);
    assert_eq!(claim.attempt(), 2);
    assert_eq!(task.retry_count(), 2);
    assert_eq!(task.error_message(), None);
}

#[rstest]
fn claim_of_ineligible_task_is_rejected() {
    let task = persisted(TaskStatus::Processing, 1);

    let result = task.prepare_claim(RetryPolicy::default(), &FixedClock::reference());

    assert!(matches!(
        result,
        Err(QueueDomainError::NotEligible {
            status: TaskStatus::Processing,
            retry_count: 1,
            ..
        })
    ));
}

#[rstest]
fn claim_no_longer_matches_after_the_task_moves_on() {
    let clock = FixedClock::reference();
    let mut task = pending(1, "Harbour Run");
    let claim = task
        .prepare_claim(RetryPolicy::default(), &clock)
        .expect("pending task is claimable");
    assert!(claim.matches(&task));

    task.apply_claim(&claim);

    assert!(!claim.matches(&task));
}

#[rstest]
#[case(1, FailureDisposition::Retryable, "Retrying: boom")]
#[case(2, FailureDisposition::Retryable, "Retrying: boom")]
#[case(3, FailureDisposition::Permanent, "Failed: boom")]
fn attempt_failure_disposition_tracks_attempt_number(
    #[case] attempt: u32,
    #[case] disposition: FailureDisposition,
    #[case] message: &str,
) {
    let policy = RetryPolicy::default();
    let task = if attempt == 1 {
        pending(9, "Hill Sprint")
    } else {
        persisted(TaskStatus::Failed, attempt - 1)
    };
    let claim = task
        .prepare_claim(policy, &FixedClock::reference())
        .expect("claimable");

    let failure = claim.failure(policy, "boom");

    assert_eq!(failure.retry_count(), attempt);
    assert_eq!(failure.disposition(), disposition);
    assert_eq!(failure.message(), message);
}

#[rstest]
fn permanent_failure_ends_the_task() {
    let mut task = persisted(TaskStatus::Processing, 3);
    let failure = FailureRecord::new(task.id(), 3, FailureDisposition::Permanent, "no output");

    task.mark_failed(&failure);

    assert_eq!(task.status(), TaskStatus::PermanentlyFailed);
    assert!(task.status().is_terminal());
    assert!(!task.is_eligible(RetryPolicy::default()));
    assert_eq!(task.error_message(), Some("Failed: no output"));
}

#[rstest]
fn completion_records_reference_and_flag() {
    let mut task = pending(1, "Harbour Run");

    task.mark_completed("https://storage.test/events/a.png");

    assert_eq!(task.status(), TaskStatus::Completed);
    assert!(task.artifact_generated());
    assert_eq!(task.result_reference(), Some("https://storage.test/events/a.png"));
}

#[rstest]
fn zero_retry_limit_is_rejected() {
    assert_eq!(RetryPolicy::new(0), Err(QueueDomainError::InvalidRetryLimit));
}

#[rstest]
#[case(None, 0)]
#[case(Some(""), 0)]
#[case(Some("  "), 0)]
#[case(Some("3"), 3)]
#[case(Some(" 4 "), 4)]
fn depth_indicator_parses_with_root_default(#[case] raw: Option<&str>, #[case] expected: u32) {
    let depth = QueueDepth::parse_indicator(raw).expect("valid depth");

    assert_eq!(depth, QueueDepth::new(expected));
}

#[rstest]
#[case("-1")]
#[case("two")]
#[case("1.5")]
fn depth_indicator_rejects_non_integers(#[case] raw: &str) {
    let result = QueueDepth::parse_indicator(Some(raw));

    assert!(matches!(result, Err(QueueDomainError::InvalidDepth(_))));
}

#[rstest]
#[case("pending", TaskStatus::Pending)]
#[case("PROCESSING", TaskStatus::Processing)]
#[case(" permanently_failed ", TaskStatus::PermanentlyFailed)]
fn status_parses_storage_representation(#[case] raw: &str, #[case] expected: TaskStatus) {
    assert_eq!(TaskStatus::try_from(raw), Ok(expected));
}

#[rstest]
fn status_rejects_unknown_values() {
    assert!(TaskStatus::try_from("archived").is_err());
}

#[rstest]
fn payload_falls_back_to_default_name_and_category() {
    let payload = TaskPayload::new().with_name("   ");

    assert_eq!(payload.name(), TaskPayload::DEFAULT_NAME);
    assert_eq!(payload.category(), TaskPayload::DEFAULT_CATEGORY);
    assert_eq!(payload.raw_name(), Some("   "));
}

#[rstest]
fn only_handled_tasks_trigger_continuation() {
    assert!(!TaskOutcome::QueueEmpty.triggers_continuation());
    assert!(!TaskOutcome::ClaimLost { task_id: task_id(1) }.triggers_continuation());
    assert!(TaskOutcome::Failed {
        task_id: task_id(1),
        retry_count: 1,
        disposition: FailureDisposition::Retryable,
        message: "Retrying: boom".to_owned(),
    }
    .triggers_continuation());
}
