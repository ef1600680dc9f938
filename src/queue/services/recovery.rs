//! Operator recovery of tasks stuck in `processing`.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use tracing::{info, warn};

use crate::queue::{
    domain::{RetryPolicy, TaskId},
    ports::{TaskStore, TaskStoreError, TaskStoreResult},
};

/// Returns stalled tasks to the retry path.
///
/// Nothing runs this automatically; a crash mid-attempt leaves its task in
/// `processing` until an operator reclaims it.
pub struct StalledTaskRecovery<R, C>
where
    R: TaskStore,
    C: Clock + Send + Sync,
{
    store: Arc<R>,
    clock: Arc<C>,
    policy: RetryPolicy,
}

impl<R, C> StalledTaskRecovery<R, C>
where
    R: TaskStore,
    C: Clock + Send + Sync,
{
    /// Creates a recovery service.
    #[must_use]
    pub const fn new(store: Arc<R>, clock: Arc<C>, policy: RetryPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    /// Reclaims tasks whose claim is older than `age`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError`] when the store update fails or `age` is
    /// out of range.
    pub async fn reclaim_older_than(&self, age: Duration) -> TaskStoreResult<Vec<TaskId>> {
        let max_age = chrono::Duration::from_std(age).map_err(TaskStoreError::persistence)?;
        let cutoff = self
            .clock
            .utc()
            .checked_sub_signed(max_age)
            .ok_or_else(|| {
                TaskStoreError::persistence(std::io::Error::other("reclaim cutoff out of range"))
            })?;

        let reclaimed = self.store.reclaim_stalled(cutoff, self.policy).await?;
        if reclaimed.is_empty() {
            info!(%cutoff, "no stalled tasks");
        } else {
            warn!(%cutoff, count = reclaimed.len(), "stalled tasks reclaimed");
        }
        Ok(reclaimed)
    }
}
