//! In-memory task store for queue tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::queue::{
    domain::{
        FailureDisposition, FailureRecord, GenerationTask, RetryPolicy, STALLED_TASK_REASON,
        TaskClaim, TaskId, TaskPayload, TaskStatus,
    },
    ports::{ClaimOutcome, TaskStore, TaskStoreError, TaskStoreResult, ensure_disposition},
};

/// Thread-safe in-memory task store.
///
/// Claims hold the write lock across check and update, so they are atomic
/// with respect to every other operation on the same store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    state: Arc<RwLock<BTreeMap<TaskId, GenerationTask>>>,
}

impl InMemoryTaskStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every stored task ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns persistence errors when lock acquisition fails.
    pub fn snapshot(&self) -> TaskStoreResult<Vec<GenerationTask>> {
        Ok(self.read()?.values().cloned().collect())
    }

    fn read(&self) -> TaskStoreResult<RwLockReadGuard<'_, BTreeMap<TaskId, GenerationTask>>> {
        self.state
            .read()
            .map_err(|err| TaskStoreError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> TaskStoreResult<RwLockWriteGuard<'_, BTreeMap<TaskId, GenerationTask>>> {
        self.state
            .write()
            .map_err(|err| TaskStoreError::persistence(std::io::Error::other(err.to_string())))
    }

    fn update_task(
        &self,
        id: TaskId,
        apply: impl FnOnce(&mut GenerationTask),
    ) -> TaskStoreResult<()> {
        let mut state = self.write()?;
        let task = state.get_mut(&id).ok_or(TaskStoreError::NotFound(id))?;
        apply(task);
        Ok(())
    }
}

/// Sort key implementing the selection order.
fn selection_rank(task: &GenerationTask) -> (u8, u32, TaskId) {
    let status_rank = u8::from(task.status() != TaskStatus::Pending);
    (status_rank, task.retry_count(), task.id())
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, task: &GenerationTask) -> TaskStoreResult<()> {
        let mut state = self.write()?;
        if state.contains_key(&task.id()) {
            return Err(TaskStoreError::DuplicateTask(task.id()));
        }
        state.insert(task.id(), task.clone());
        Ok(())
    }

    async fn enqueue(&self, payload: &TaskPayload) -> TaskStoreResult<TaskId> {
        let mut state = self.write()?;
        let next_value = state
            .keys()
            .next_back()
            .map_or(1, |last| last.value().saturating_add(1));
        let id = TaskId::new(next_value).map_err(TaskStoreError::persistence)?;
        state.insert(id, GenerationTask::new_pending(id, payload.clone()));
        Ok(id)
    }

    async fn find_by_id(&self, id: TaskId) -> TaskStoreResult<Option<GenerationTask>> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn select_next_eligible(
        &self,
        policy: RetryPolicy,
    ) -> TaskStoreResult<Option<GenerationTask>> {
        let state = self.read()?;
        Ok(state
            .values()
            .filter(|task| task.is_eligible(policy))
            .min_by_key(|task| selection_rank(task))
            .cloned())
    }

    async fn claim(&self, claim: &TaskClaim) -> TaskStoreResult<ClaimOutcome> {
        let mut state = self.write()?;
        let Some(task) = state.get_mut(&claim.task_id()) else {
            return Ok(ClaimOutcome::Lost);
        };
        if !claim.matches(task) {
            return Ok(ClaimOutcome::Lost);
        }
        task.apply_claim(claim);
        Ok(ClaimOutcome::Claimed(task.clone()))
    }

    async fn record_prompt(&self, id: TaskId, prompt: &str) -> TaskStoreResult<()> {
        self.update_task(id, |task| task.record_prompt(prompt))
    }

    async fn mark_completed(&self, id: TaskId, reference: &str) -> TaskStoreResult<()> {
        self.update_task(id, |task| task.mark_completed(reference))
    }

    async fn mark_retryable_failure(&self, failure: &FailureRecord) -> TaskStoreResult<()> {
        ensure_disposition(failure, FailureDisposition::Retryable)?;
        self.update_task(failure.task_id(), |task| task.mark_failed(failure))
    }

    async fn mark_permanent_failure(&self, failure: &FailureRecord) -> TaskStoreResult<()> {
        ensure_disposition(failure, FailureDisposition::Permanent)?;
        self.update_task(failure.task_id(), |task| task.mark_failed(failure))
    }

    async fn count_eligible_pending(&self) -> TaskStoreResult<u64> {
        let state = self.read()?;
        let count = state
            .values()
            .filter(|task| task.status() == TaskStatus::Pending)
            .count();
        u64::try_from(count).map_err(TaskStoreError::persistence)
    }

    async fn reclaim_stalled(
        &self,
        cutoff: DateTime<Utc>,
        policy: RetryPolicy,
    ) -> TaskStoreResult<Vec<TaskId>> {
        let mut state = self.write()?;
        let mut reclaimed = Vec::new();
        for task in state.values_mut() {
            let is_stalled = task.status() == TaskStatus::Processing
                && task
                    .generation_started_at()
                    .is_none_or(|started_at| started_at < cutoff);
            if is_stalled {
                let failure = task.stalled_failure(policy, STALLED_TASK_REASON);
                task.mark_failed(&failure);
                reclaimed.push(task.id());
            }
        }
        Ok(reclaimed)
    }
}
