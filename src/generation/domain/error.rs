//! Error types for generation submission and polling.

use super::JobHandle;
use std::sync::Arc;
use thiserror::Error;

/// Result type for generation operations.
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Errors returned while driving an external generation job.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// The service refused the submission.
    #[error("generation submission rejected: {reason}")]
    SubmissionRejected {
        /// Acceptance code or HTTP status reported by the service, if any.
        code: Option<i64>,
        /// Message reported by the service.
        reason: String,
    },

    /// The service replied with a body that does not follow its contract.
    #[error("malformed generation response: {0}")]
    MalformedResponse(String),

    /// The service reported the job as failed.
    #[error("generation job {job} failed with status {status}")]
    JobFailed {
        /// Failed job.
        job: JobHandle,
        /// Terminal status code reported by the service.
        status: i64,
    },

    /// The job did not finish within the polling budget.
    #[error("generation job {job} timed out after {attempts} status checks")]
    TimedOut {
        /// Unfinished job.
        job: JobHandle,
        /// Status checks performed.
        attempts: u32,
    },

    /// The job reported success but no output reference could be found.
    #[error("generation job {0} reported success but no output found")]
    MissingOutput(JobHandle),

    /// The polling policy is invalid.
    #[error("poll attempts must be at least one")]
    InvalidPollPolicy,

    /// Transport-level failure while talking to the service.
    #[error("generation transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl GenerationError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }

    /// Returns a stable label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SubmissionRejected { .. } => "submission_rejected",
            Self::MalformedResponse(_) => "malformed_response",
            Self::JobFailed { .. } => "job_failed",
            Self::TimedOut { .. } => "timed_out",
            Self::MissingOutput(_) => "missing_output",
            Self::InvalidPollPolicy => "invalid_poll_policy",
            Self::Transport(_) => "transport",
        }
    }
}
