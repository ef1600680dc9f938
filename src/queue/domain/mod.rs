//! Domain model for the generation task queue.
//!
//! The queue domain models task eligibility, conditional claims, attempt
//! accounting and invocation outcomes while keeping storage, generation and
//! artifact concerns outside of the domain boundary.

mod error;
mod ids;
mod outcome;
mod retry;
mod task;

pub use error::{ParseTaskStatusError, QueueDomainError};
pub use ids::{InvocationId, QueueDepth, TaskId};
pub use outcome::{ContinuationDecision, InvocationReport, TaskOutcome};
pub use retry::{DEFAULT_MAX_RETRIES, FailureDisposition, RetryPolicy};
pub use task::{
    FailureRecord, GenerationTask, PersistedTaskData, STALLED_TASK_REASON, TaskClaim, TaskPayload,
    TaskStatus,
};
