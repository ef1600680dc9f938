//! Error types for queue domain validation and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or transitioning queue domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueueDomainError {
    /// The task identifier is not a positive integer.
    #[error("invalid task identifier {0}, expected a positive integer")]
    InvalidTaskId(i64),

    /// The continuation depth could not be parsed.
    #[error("invalid continuation depth '{0}', expected a non-negative integer")]
    InvalidDepth(String),

    /// A retry limit of zero would make every task permanently failed.
    #[error("retry limit must be at least 1")]
    InvalidRetryLimit,

    /// The task is not in a claimable state.
    #[error(
        "task {task_id} is not eligible for claim (status {status}, retry count {retry_count})"
    )]
    NotEligible {
        /// Task that was asked to be claimed.
        task_id: TaskId,
        /// Status observed on the task.
        status: TaskStatus,
        /// Retry count observed on the task.
        retry_count: u32,
    },
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
