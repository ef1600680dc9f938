//! Port for the external asynchronous generation service.

use crate::generation::domain::{GenerationRequest, GenerationResult, JobHandle, StatusReport};
use async_trait::async_trait;

/// Submission and status contract of a generation service.
#[async_trait]
pub trait GenerationApi: Send + Sync {
    /// Submits `request` and returns the job handle assigned to it.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionRejected` when the service refuses the work,
    /// `MalformedResponse` when its reply lacks a job handle, or `Transport`.
    async fn submit(&self, request: &GenerationRequest) -> GenerationResult<JobHandle>;

    /// Performs one status check of `job`.
    ///
    /// # Errors
    ///
    /// Returns `Transport` or `MalformedResponse` when the check itself fails.
    async fn status(&self, job: &JobHandle) -> GenerationResult<StatusReport>;
}
