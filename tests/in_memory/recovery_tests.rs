//! Operator recovery of tasks left in `processing` by a crashed invocation.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use genqueue::queue::{domain::TaskStatus, services::StalledTaskRecovery};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

use crate::test_helpers::QueueRig;

#[fixture]
fn rig() -> QueueRig {
    QueueRig::new()
}

const ONE_HOUR: Duration = Duration::from_secs(3600);

#[rstest]
#[tokio::test]
async fn stalled_tasks_return_to_the_retry_path(rig: QueueRig) {
    let two_hours_ago = Utc::now() - chrono::Duration::hours(2);
    let stalled = rig
        .insert(1, "Harbour Run", TaskStatus::Processing, 1, Some(two_hours_ago))
        .await;
    let exhausted = rig
        .insert(2, "Hill Sprint", TaskStatus::Processing, 3, Some(two_hours_ago))
        .await;
    let in_flight = rig
        .insert(3, "Lake Swim", TaskStatus::Processing, 0, Some(Utc::now()))
        .await;
    let recovery =
        StalledTaskRecovery::new(Arc::clone(&rig.store), Arc::new(DefaultClock), rig.policy);

    let reclaimed = recovery
        .reclaim_older_than(ONE_HOUR)
        .await
        .expect("reclaim should succeed");

    assert_eq!(reclaimed, vec![stalled, exhausted]);

    let retried = rig.task(stalled).await;
    assert_eq!(retried.status(), TaskStatus::Failed);
    assert_eq!(retried.retry_count(), 1);
    assert_eq!(
        retried.error_message(),
        Some("Retrying: reclaimed after stalled processing")
    );
    assert_eq!(rig.task(exhausted).await.status(), TaskStatus::PermanentlyFailed);
    assert_eq!(rig.task(in_flight).await.status(), TaskStatus::Processing);
}

#[rstest]
#[tokio::test]
async fn reclaimed_task_is_picked_up_again(rig: QueueRig) {
    let stalled = rig
        .insert(
            1,
            "Harbour Run",
            TaskStatus::Processing,
            1,
            Some(Utc::now() - chrono::Duration::hours(2)),
        )
        .await;
    rig.script_success("job-1");
    StalledTaskRecovery::new(Arc::clone(&rig.store), Arc::new(DefaultClock), rig.policy)
        .reclaim_older_than(ONE_HOUR)
        .await
        .expect("reclaim should succeed");

    rig.processor()
        .process_next()
        .await
        .expect("processing should run");

    let task = rig.task(stalled).await;
    assert_eq!(task.status(), TaskStatus::Completed);
    assert_eq!(task.retry_count(), 2);
}
