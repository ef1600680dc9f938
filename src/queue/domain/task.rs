//! Generation task aggregate root and related lifecycle types.

use super::{FailureDisposition, ParseTaskStatusError, QueueDomainError, RetryPolicy, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Reason recorded on tasks recovered from a stalled `processing` state.
pub const STALLED_TASK_REASON: &str = "reclaimed after stalled processing";

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is waiting for its first attempt.
    Pending,
    /// Task has been claimed by an invocation.
    Processing,
    /// Task produced its artifact.
    Completed,
    /// The last attempt failed; the task may be retried.
    Failed,
    /// The task exhausted its attempts.
    PermanentlyFailed,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::PermanentlyFailed => "permanently_failed",
        }
    }

    /// Returns `true` for statuses no invocation will ever leave.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::PermanentlyFailed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "permanently_failed" => Ok(Self::PermanentlyFailed),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Domain payload carried by a task.
///
/// The queue engine never interprets these fields; they are handed to the
/// prompt composer as context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPayload {
    name: Option<String>,
    category: Option<String>,
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
}

impl TaskPayload {
    /// Name used when a task carries no human-readable name.
    pub const DEFAULT_NAME: &'static str = "Unknown Event";

    /// Category used when a task carries none.
    pub const DEFAULT_CATEGORY: &'static str = "Running";

    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the human-readable name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Adds one contextual attribute, replacing any previous value.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Replaces all contextual attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: BTreeMap<String, Value>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Returns the name, falling back to [`TaskPayload::DEFAULT_NAME`].
    #[must_use]
    pub fn name(&self) -> &str {
        non_blank(self.name.as_deref()).unwrap_or(Self::DEFAULT_NAME)
    }

    /// Returns the category, falling back to [`TaskPayload::DEFAULT_CATEGORY`].
    #[must_use]
    pub fn category(&self) -> &str {
        non_blank(self.category.as_deref()).unwrap_or(Self::DEFAULT_CATEGORY)
    }

    /// Returns the stored name without fallback.
    #[must_use]
    pub fn raw_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the stored category without fallback.
    #[must_use]
    pub fn raw_category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Returns the contextual attributes.
    #[must_use]
    pub const fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

/// Generation task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationTask {
    id: TaskId,
    status: TaskStatus,
    retry_count: u32,
    error_message: Option<String>,
    generation_started_at: Option<DateTime<Utc>>,
    generation_prompt: Option<String>,
    result_reference: Option<String>,
    artifact_generated: bool,
    payload: TaskPayload,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted attempt counter.
    pub retry_count: u32,
    /// Last recorded failure reason.
    pub error_message: Option<String>,
    /// Timestamp of the latest claim.
    pub generation_started_at: Option<DateTime<Utc>>,
    /// Instruction built for the latest attempt.
    pub generation_prompt: Option<String>,
    /// Durable reference to the produced artifact.
    pub result_reference: Option<String>,
    /// Whether the artifact was produced.
    pub artifact_generated: bool,
    /// Opaque domain payload.
    pub payload: TaskPayload,
}

impl GenerationTask {
    /// Creates a task awaiting its first attempt.
    #[must_use]
    pub const fn new_pending(id: TaskId, payload: TaskPayload) -> Self {
        Self {
            id,
            status: TaskStatus::Pending,
            retry_count: 0,
            error_message: None,
            generation_started_at: None,
            generation_prompt: None,
            result_reference: None,
            artifact_generated: false,
            payload,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            status: data.status,
            retry_count: data.retry_count,
            error_message: data.error_message,
            generation_started_at: data.generation_started_at,
            generation_prompt: data.generation_prompt,
            result_reference: data.result_reference,
            artifact_generated: data.artifact_generated,
            payload: data.payload,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the attempt counter.
    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Returns the last failure reason, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Returns the timestamp of the latest claim.
    #[must_use]
    pub const fn generation_started_at(&self) -> Option<DateTime<Utc>> {
        self.generation_started_at
    }

    /// Returns the instruction built for the latest attempt.
    #[must_use]
    pub fn generation_prompt(&self) -> Option<&str> {
        self.generation_prompt.as_deref()
    }

    /// Returns the durable artifact reference of a completed task.
    #[must_use]
    pub fn result_reference(&self) -> Option<&str> {
        self.result_reference.as_deref()
    }

    /// Returns whether the artifact was produced.
    #[must_use]
    pub const fn artifact_generated(&self) -> bool {
        self.artifact_generated
    }

    /// Returns the domain payload.
    #[must_use]
    pub const fn payload(&self) -> &TaskPayload {
        &self.payload
    }

    /// Returns `true` when the task may be selected under `policy`.
    ///
    /// Only `pending` tasks and `failed` tasks with attempts left qualify.
    #[must_use]
    pub const fn is_eligible(&self, policy: RetryPolicy) -> bool {
        match self.status {
            TaskStatus::Pending => true,
            TaskStatus::Failed => policy.allows_retry(self.retry_count),
            TaskStatus::Processing | TaskStatus::Completed | TaskStatus::PermanentlyFailed => false,
        }
    }

    /// Computes the conditional claim for this task as currently observed.
    ///
    /// # Errors
    ///
    /// Returns [`QueueDomainError::NotEligible`] when the task cannot be
    /// claimed under `policy`.
    pub fn prepare_claim(
        &self,
        policy: RetryPolicy,
        clock: &impl Clock,
    ) -> Result<TaskClaim, QueueDomainError> {
        if !self.is_eligible(policy) {
            return Err(QueueDomainError::NotEligible {
                task_id: self.id,
                status: self.status,
                retry_count: self.retry_count,
            });
        }

        let is_retry = self.status == TaskStatus::Failed;
        let retry_count = if is_retry {
            self.retry_count.saturating_add(1)
        } else {
            self.retry_count
        };

        Ok(TaskClaim {
            task_id: self.id,
            expected_status: self.status,
            expected_retry_count: self.retry_count,
            retry_count,
            attempt: self.retry_count.saturating_add(1),
            started_at: clock.utc(),
        })
    }

    /// Applies a claim whose preconditions the caller has verified.
    pub fn apply_claim(&mut self, claim: &TaskClaim) {
        self.status = TaskStatus::Processing;
        self.generation_started_at = Some(claim.started_at);
        self.error_message = None;
        self.retry_count = claim.retry_count;
    }

    /// Stores the instruction built for the current attempt.
    pub fn record_prompt(&mut self, prompt: impl Into<String>) {
        self.generation_prompt = Some(prompt.into());
    }

    /// Marks the task completed with its durable artifact reference.
    pub fn mark_completed(&mut self, reference: impl Into<String>) {
        self.status = TaskStatus::Completed;
        self.result_reference = Some(reference.into());
        self.artifact_generated = true;
    }

    /// Records a failed attempt.
    pub fn mark_failed(&mut self, failure: &FailureRecord) {
        self.status = match failure.disposition {
            FailureDisposition::Retryable => TaskStatus::Failed,
            FailureDisposition::Permanent => TaskStatus::PermanentlyFailed,
        };
        self.retry_count = failure.retry_count;
        self.error_message = Some(failure.message.clone());
    }

    /// Builds the failure record used to recover a task stuck in
    /// `processing`.
    ///
    /// The claim already counted the interrupted attempt, so the retry count
    /// is kept as-is.
    #[must_use]
    pub fn stalled_failure(&self, policy: RetryPolicy, reason: &str) -> FailureRecord {
        let disposition = if policy.allows_retry(self.retry_count) {
            FailureDisposition::Retryable
        } else {
            FailureDisposition::Permanent
        };
        FailureRecord::new(self.id, self.retry_count, disposition, reason)
    }
}

/// Conditional claim of one task.
///
/// A store applies it only if the task still shows the status and retry
/// count observed at selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskClaim {
    task_id: TaskId,
    expected_status: TaskStatus,
    expected_retry_count: u32,
    retry_count: u32,
    attempt: u32,
    started_at: DateTime<Utc>,
}

impl TaskClaim {
    /// Returns the claimed task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the status the task must still have.
    #[must_use]
    pub const fn expected_status(&self) -> TaskStatus {
        self.expected_status
    }

    /// Returns the retry count the task must still have.
    #[must_use]
    pub const fn expected_retry_count(&self) -> u32 {
        self.expected_retry_count
    }

    /// Returns the retry count written by the claim.
    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Returns the one-based number of the attempt this claim starts.
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Returns the claim timestamp.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns `true` when `task` still satisfies the claim preconditions.
    #[must_use]
    pub fn matches(&self, task: &GenerationTask) -> bool {
        task.id == self.task_id
            && task.status == self.expected_status
            && task.retry_count == self.expected_retry_count
    }

    /// Builds the failure record for this attempt.
    #[must_use]
    pub fn failure(&self, policy: RetryPolicy, reason: &str) -> FailureRecord {
        FailureRecord::new(
            self.task_id,
            self.attempt,
            policy.disposition_for(self.attempt),
            reason,
        )
    }
}

/// Outcome of a failed attempt, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    task_id: TaskId,
    retry_count: u32,
    disposition: FailureDisposition,
    message: String,
}

impl FailureRecord {
    /// Creates a failure record, prefixing `reason` according to the
    /// disposition.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        retry_count: u32,
        disposition: FailureDisposition,
        reason: &str,
    ) -> Self {
        Self {
            task_id,
            retry_count,
            disposition,
            message: format!("{}: {reason}", disposition.message_prefix()),
        }
    }

    /// Returns the failed task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the retry count to persist.
    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Returns whether the task stays eligible.
    #[must_use]
    pub const fn disposition(&self) -> FailureDisposition {
        self.disposition
    }

    /// Returns the message to persist.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
