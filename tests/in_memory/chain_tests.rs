//! Self-continuing chains over the in-process channel scheduler.

use std::sync::Arc;

use genqueue::queue::{
    adapters::memory::{ChannelContinuation, RecordingContinuation},
    domain::{ContinuationDecision, QueueDepth, TaskOutcome, TaskStatus},
    services::{ProcessInvocation, drive_chain},
};
use rstest::{fixture, rstest};

use crate::test_helpers::QueueRig;

#[fixture]
fn rig() -> QueueRig {
    QueueRig::new()
}

#[rstest]
#[tokio::test]
async fn chain_drains_every_pending_task(rig: QueueRig) {
    let mut ids = Vec::new();
    for (index, name) in ["Harbour Run", "Hill Sprint", "Lake Swim"].iter().enumerate() {
        ids.push(rig.enqueue(name).await);
        rig.script_success(&format!("job-{index}"));
    }
    let (scheduler, mut receiver) = ChannelContinuation::channel();
    let entry = rig.entry_point(Arc::new(scheduler));

    let reports = drive_chain(&entry, &mut receiver, QueueDepth::ROOT).await;

    let depths: Vec<u32> = reports.iter().map(|report| report.depth.value()).collect();
    assert_eq!(depths, vec![0, 1, 2]);
    assert_eq!(
        reports.last().map(|report| report.continuation),
        Some(ContinuationDecision::Drained)
    );
    for id in ids {
        assert_eq!(rig.task(id).await.status(), TaskStatus::Completed);
    }
}

#[rstest]
#[tokio::test]
async fn depth_guard_stops_a_long_chain(#[from(rig)] base: QueueRig) {
    let rig = base.with_max_depth(2);
    let mut ids = Vec::new();
    for index in 0..5 {
        ids.push(rig.enqueue(&format!("Relay Leg {index}")).await);
        rig.script_success(&format!("job-{index}"));
    }
    let (scheduler, mut receiver) = ChannelContinuation::channel();
    let entry = rig.entry_point(Arc::new(scheduler));

    let reports = drive_chain(&entry, &mut receiver, QueueDepth::ROOT).await;

    assert_eq!(reports.len(), 2);
    let mut statuses = Vec::new();
    for id in ids {
        statuses.push(rig.task(id).await.status());
    }
    assert_eq!(
        statuses,
        vec![
            TaskStatus::Completed,
            TaskStatus::Completed,
            TaskStatus::Pending,
            TaskStatus::Pending,
            TaskStatus::Pending,
        ]
    );
}

#[rstest]
#[tokio::test]
async fn continuation_is_never_requested_beyond_the_limit(rig: QueueRig) {
    for index in 0..8 {
        rig.enqueue(&format!("Loop {index}")).await;
        rig.script_success(&format!("job-{index}"));
    }
    let scheduler = RecordingContinuation::new();
    let entry = rig.entry_point(Arc::new(scheduler.clone()));

    let mut depth = QueueDepth::ROOT;
    while let Ok(report) = entry.invoke(depth).await {
        match report.continuation {
            ContinuationDecision::Scheduled { next_depth, .. } => depth = next_depth,
            _ => break,
        }
    }

    let requested = scheduler.requested();
    let limit = usize::try_from(rig.max_depth.value()).expect("limit fits usize");
    assert_eq!(requested.len(), limit);
    assert!(requested.iter().all(|next| *next <= rig.max_depth));
}

#[rstest]
#[tokio::test]
async fn failed_task_does_not_halt_the_chain(rig: QueueRig) {
    let failing = rig.enqueue("Broken Route").await;
    let healthy = rig.enqueue("Harbour Run").await;
    rig.api.push_submission(Err(
        genqueue::generation::domain::GenerationError::SubmissionRejected {
            code: Some(402),
            reason: "insufficient credits".to_owned(),
        },
    ));
    rig.script_success("job-2");
    let (scheduler, mut receiver) = ChannelContinuation::channel();
    let entry = rig.entry_point(Arc::new(scheduler));

    let reports = drive_chain(&entry, &mut receiver, QueueDepth::ROOT).await;

    assert!(matches!(
        reports.first().map(|report| &report.outcome),
        Some(TaskOutcome::Failed { .. })
    ));
    assert_eq!(rig.task(healthy).await.status(), TaskStatus::Completed);
    // Only pending tasks keep a chain alive; the retryable failure waits for
    // the next external trigger.
    assert_eq!(rig.task(failing).await.status(), TaskStatus::Failed);
    assert_eq!(
        reports.last().map(|report| report.continuation),
        Some(ContinuationDecision::Drained)
    );
}
