//! Store port for task persistence, claim and outcome updates.

use crate::queue::domain::{
    FailureDisposition, FailureRecord, GenerationTask, RetryPolicy, TaskClaim, TaskId, TaskPayload,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Result of a conditional claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The claim was applied; the task as stored after the claim.
    Claimed(GenerationTask),
    /// The task changed since selection and was not touched.
    Lost,
}

/// Task persistence contract.
///
/// Every mutation is a single-task update keyed by identity.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Stores a task exactly as given.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::DuplicateTask`] when the identifier already
    /// exists.
    async fn insert(&self, task: &GenerationTask) -> TaskStoreResult<()>;

    /// Stores a new `pending` task and returns its assigned identifier.
    async fn enqueue(&self, payload: &TaskPayload) -> TaskStoreResult<TaskId>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskStoreResult<Option<GenerationTask>>;

    /// Returns at most one eligible task.
    ///
    /// `pending` tasks come before retryable `failed` tasks, lower retry
    /// counts first, ties broken by ascending identifier.
    async fn select_next_eligible(
        &self,
        policy: RetryPolicy,
    ) -> TaskStoreResult<Option<GenerationTask>>;

    /// Applies `claim` atomically if the task still matches its
    /// preconditions.
    async fn claim(&self, claim: &TaskClaim) -> TaskStoreResult<ClaimOutcome>;

    /// Persists the instruction built for the current attempt.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when the task does not exist.
    async fn record_prompt(&self, id: TaskId, prompt: &str) -> TaskStoreResult<()>;

    /// Marks a task completed with its durable artifact reference.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when the task does not exist.
    async fn mark_completed(&self, id: TaskId, reference: &str) -> TaskStoreResult<()>;

    /// Records a failure that leaves the task eligible for retry.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::DispositionMismatch`] when the record is not
    /// retryable, or [`TaskStoreError::NotFound`].
    async fn mark_retryable_failure(&self, failure: &FailureRecord) -> TaskStoreResult<()>;

    /// Records a failure that ends the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::DispositionMismatch`] when the record is not
    /// permanent, or [`TaskStoreError::NotFound`].
    async fn mark_permanent_failure(&self, failure: &FailureRecord) -> TaskStoreResult<()>;

    /// Counts tasks in `pending` status.
    ///
    /// Retryable `failed` tasks are not included.
    async fn count_eligible_pending(&self) -> TaskStoreResult<u64>;

    /// Moves tasks left in `processing` since before `cutoff` back to
    /// `failed`, or to `permanently_failed` when they have no attempts left.
    ///
    /// Returns the identifiers of reclaimed tasks.
    async fn reclaim_stalled(
        &self,
        cutoff: DateTime<Utc>,
        policy: RetryPolicy,
    ) -> TaskStoreResult<Vec<TaskId>>;
}

/// Errors returned by task store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskStoreError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A failure record was routed to the wrong update.
    #[error("failure record for task {task_id} is not {expected:?}")]
    DispositionMismatch {
        /// Task the record refers to.
        task_id: TaskId,
        /// Disposition the update requires.
        expected: FailureDisposition,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

/// Verifies that `failure` carries the disposition an update expects.
///
/// # Errors
///
/// Returns [`TaskStoreError::DispositionMismatch`] otherwise.
pub fn ensure_disposition(
    failure: &FailureRecord,
    expected: FailureDisposition,
) -> TaskStoreResult<()> {
    if failure.disposition() == expected {
        return Ok(());
    }
    Err(TaskStoreError::DispositionMismatch {
        task_id: failure.task_id(),
        expected,
    })
}
