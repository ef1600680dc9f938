//! Results reported by one processing invocation.

use super::{FailureDisposition, InvocationId, QueueDepth, TaskId};
use serde::Serialize;

/// What the processor did with (at most) one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    /// No task was eligible.
    QueueEmpty,
    /// The selected task was claimed by another chain first.
    ClaimLost {
        /// Task whose claim was lost.
        task_id: TaskId,
    },
    /// The task produced its artifact.
    Completed {
        /// Completed task.
        task_id: TaskId,
        /// Human-readable task name.
        name: String,
        /// Durable public reference of the artifact.
        reference: String,
    },
    /// The attempt failed and was recorded on the task.
    Failed {
        /// Failed task.
        task_id: TaskId,
        /// Retry count persisted with the failure.
        retry_count: u32,
        /// Whether the task stays eligible.
        disposition: FailureDisposition,
        /// Persisted failure message.
        message: String,
    },
}

impl TaskOutcome {
    /// Returns `true` when the invocation handled a task and should try to
    /// continue the chain.
    #[must_use]
    pub const fn triggers_continuation(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }

    /// Returns the task this outcome refers to, if any.
    #[must_use]
    pub const fn task_id(&self) -> Option<TaskId> {
        match self {
            Self::QueueEmpty => None,
            Self::ClaimLost { task_id }
            | Self::Completed { task_id, .. }
            | Self::Failed { task_id, .. } => Some(*task_id),
        }
    }
}

/// Whether the chain was continued after an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ContinuationDecision {
    /// The invocation did not handle a task, so no continuation was
    /// considered.
    NotAttempted,
    /// The next invocation was requested.
    Scheduled {
        /// Depth carried by the next invocation.
        next_depth: QueueDepth,
        /// Pending tasks at decision time.
        remaining: u64,
    },
    /// No pending task remains.
    Drained,
    /// Pending tasks remain but the depth guard stopped the chain.
    ///
    /// [`QueueEntryPoint`](crate::queue::services::QueueEntryPoint) refuses
    /// `depth >= max_depth` before processing, so through the entry point a
    /// chain ends with the last scheduled continuation being refused
    /// instead. Callers driving the trigger directly see this decision.
    DepthLimitReached {
        /// Pending tasks at decision time.
        remaining: u64,
    },
    /// The scheduler refused the request; the failure was logged.
    ScheduleFailed {
        /// Pending tasks at decision time.
        remaining: u64,
    },
    /// The pending count could not be read; the chain stopped.
    CountUnavailable,
}

impl ContinuationDecision {
    /// Returns the pending count observed while deciding, when known.
    #[must_use]
    pub const fn remaining(self) -> Option<u64> {
        match self {
            Self::Scheduled { remaining, .. }
            | Self::DepthLimitReached { remaining }
            | Self::ScheduleFailed { remaining } => Some(remaining),
            Self::Drained => Some(0),
            Self::NotAttempted | Self::CountUnavailable => None,
        }
    }
}

/// Structured response of one entry-point invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationReport {
    /// Correlation identifier of the invocation.
    pub invocation_id: InvocationId,
    /// Depth the invocation ran at.
    pub depth: QueueDepth,
    /// What happened to the selected task.
    pub outcome: TaskOutcome,
    /// Whether the chain continues.
    pub continuation: ContinuationDecision,
}

impl InvocationReport {
    /// Returns the remaining pending count, when known.
    #[must_use]
    pub const fn remaining(&self) -> Option<u64> {
        self.continuation.remaining()
    }
}
