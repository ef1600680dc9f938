//! One-task state machine: select, claim, generate, materialize, record.

use std::sync::Arc;

use mockable::Clock;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::artifact::{
    domain::ArtifactError,
    ports::{ArtifactSource, ArtifactStorage},
    services::ResultMaterializer,
};
use crate::generation::{domain::GenerationError, ports::GenerationApi, services::GenerationClient};
use crate::prompt::{domain::PromptError, ports::PromptComposer};
use crate::queue::{
    domain::{
        FailureDisposition, GenerationTask, QueueDomainError, RetryPolicy, TaskClaim, TaskId,
        TaskOutcome,
    },
    ports::{ClaimOutcome, TaskStore, TaskStoreError},
};

/// Errors that abort an invocation instead of being recorded on a task.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// Selecting or claiming a task failed; no task was modified.
    #[error("task store unavailable: {0}")]
    Store(#[from] TaskStoreError),

    /// The selected task could not be claimed under the retry policy.
    #[error(transparent)]
    Domain(#[from] QueueDomainError),

    /// The task was processed but its outcome could not be written; it stays
    /// in `processing`.
    #[error("outcome of task {task_id} could not be recorded: {source}")]
    OutcomeWrite {
        /// Task left in `processing`.
        task_id: TaskId,
        /// Store error raised by the update.
        source: TaskStoreError,
    },
}

/// Result type for processor operations.
pub type ProcessorResult<T> = Result<T, ProcessorError>;

/// Failure of one attempt, recorded on the task.
#[derive(Debug, Error)]
enum AttemptError {
    #[error("prompt composition failed: {0}")]
    Prompt(#[from] PromptError),

    #[error("prompt could not be recorded: {0}")]
    PromptRecord(TaskStoreError),

    #[error("{0}")]
    Generation(#[from] GenerationError),

    #[error("{0}")]
    Artifact(#[from] ArtifactError),
}

impl AttemptError {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Prompt(err) => err.kind(),
            Self::PromptRecord(_) => "prompt_record",
            Self::Generation(err) => err.kind(),
            Self::Artifact(err) => err.kind(),
        }
    }
}

/// Collaborators driving one attempt of a claimed task.
pub struct ProcessingPipeline<C>
where
    C: Clock + Send + Sync,
{
    /// Builds the instruction.
    pub composer: Arc<dyn PromptComposer>,
    /// Submits and polls the generation job.
    pub generation: GenerationClient<dyn GenerationApi>,
    /// Stores the finished output.
    pub materializer: ResultMaterializer<dyn ArtifactSource, dyn ArtifactStorage, C>,
}

/// Processes at most one eligible task per call.
pub struct TaskProcessor<R, C>
where
    R: TaskStore,
    C: Clock + Send + Sync,
{
    store: Arc<R>,
    clock: Arc<C>,
    policy: RetryPolicy,
    pipeline: ProcessingPipeline<C>,
}

impl<R, C> TaskProcessor<R, C>
where
    R: TaskStore,
    C: Clock + Send + Sync,
{
    /// Creates a processor.
    #[must_use]
    pub const fn new(
        store: Arc<R>,
        clock: Arc<C>,
        policy: RetryPolicy,
        pipeline: ProcessingPipeline<C>,
    ) -> Self {
        Self {
            store,
            clock,
            policy,
            pipeline,
        }
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Returns the task store.
    #[must_use]
    pub const fn store(&self) -> &Arc<R> {
        &self.store
    }

    /// Selects, claims and drives one task to an outcome.
    ///
    /// Attempt failures are recorded on the task and reported as
    /// [`TaskOutcome::Failed`]; they are never retried within the call.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessorError::Store`] when selection or claim fails and
    /// [`ProcessorError::OutcomeWrite`] when the final update fails.
    #[instrument(skip(self))]
    pub async fn process_next(&self) -> ProcessorResult<TaskOutcome> {
        let Some(selected) = self.store.select_next_eligible(self.policy).await? else {
            debug!("no eligible task");
            return Ok(TaskOutcome::QueueEmpty);
        };

        let claim = selected.prepare_claim(self.policy, &*self.clock)?;
        let task = match self.store.claim(&claim).await? {
            ClaimOutcome::Claimed(task) => task,
            ClaimOutcome::Lost => {
                info!(task_id = %claim.task_id(), "task claimed by another chain");
                return Ok(TaskOutcome::ClaimLost {
                    task_id: claim.task_id(),
                });
            }
        };
        info!(
            task_id = %task.id(),
            attempt = claim.attempt(),
            name = task.payload().name(),
            "task claimed"
        );

        match self.attempt(&task).await {
            Ok(reference) => self.record_completion(&task, reference).await,
            Err(error) => self.record_failure(&claim, &error).await,
        }
    }

    async fn attempt(&self, task: &GenerationTask) -> Result<String, AttemptError> {
        let instruction = self.pipeline.composer.compose(task).await?;
        self.store
            .record_prompt(task.id(), &instruction)
            .await
            .map_err(AttemptError::PromptRecord)?;

        let job = self.pipeline.generation.submit(&instruction).await?;
        debug!(task_id = %task.id(), job = %job, "polling generation job");
        let output = self.pipeline.generation.poll_until_done(&job).await?;

        let stored = self
            .pipeline
            .materializer
            .materialize(output.as_str(), task.payload().name())
            .await?;
        Ok(stored.reference().to_owned())
    }

    async fn record_completion(
        &self,
        task: &GenerationTask,
        reference: String,
    ) -> ProcessorResult<TaskOutcome> {
        self.store
            .mark_completed(task.id(), &reference)
            .await
            .map_err(|source| ProcessorError::OutcomeWrite {
                task_id: task.id(),
                source,
            })?;
        info!(task_id = %task.id(), %reference, "task completed");
        Ok(TaskOutcome::Completed {
            task_id: task.id(),
            name: task.payload().name().to_owned(),
            reference,
        })
    }

    async fn record_failure(
        &self,
        claim: &TaskClaim,
        error: &AttemptError,
    ) -> ProcessorResult<TaskOutcome> {
        let failure = claim.failure(self.policy, &error.to_string());
        let written = match failure.disposition() {
            FailureDisposition::Retryable => self.store.mark_retryable_failure(&failure).await,
            FailureDisposition::Permanent => self.store.mark_permanent_failure(&failure).await,
        };
        written.map_err(|source| ProcessorError::OutcomeWrite {
            task_id: claim.task_id(),
            source,
        })?;

        warn!(
            task_id = %claim.task_id(),
            attempt = claim.attempt(),
            failure_kind = error.kind(),
            permanent = failure.disposition().is_permanent(),
            message = failure.message(),
            "task attempt failed"
        );
        Ok(TaskOutcome::Failed {
            task_id: claim.task_id(),
            retry_count: failure.retry_count(),
            disposition: failure.disposition(),
            message: failure.message().to_owned(),
        })
    }
}
