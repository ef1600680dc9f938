//! Submission and bounded polling of generation jobs.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::generation::{
    domain::{
        GenerationError, GenerationRequest, GenerationResult, JobHandle, JobProgress,
        OutputReference, PollPolicy, extract_output_reference,
    },
    ports::GenerationApi,
};

/// Drives one instruction through the generation service.
pub struct GenerationClient<A>
where
    A: GenerationApi + ?Sized,
{
    api: Arc<A>,
    policy: PollPolicy,
    output_count: u32,
}

impl<A> Clone for GenerationClient<A>
where
    A: GenerationApi + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            policy: self.policy,
            output_count: self.output_count,
        }
    }
}

impl<A> GenerationClient<A>
where
    A: GenerationApi + ?Sized,
{
    /// Creates a client requesting `output_count` outputs per job.
    #[must_use]
    pub const fn new(api: Arc<A>, policy: PollPolicy, output_count: u32) -> Self {
        Self {
            api,
            policy,
            output_count,
        }
    }

    /// Returns the polling policy.
    #[must_use]
    pub const fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Submits `instruction` once.
    ///
    /// # Errors
    ///
    /// Propagates submission errors from the service without retrying.
    pub async fn submit(&self, instruction: &str) -> GenerationResult<JobHandle> {
        let request = GenerationRequest::new(instruction, self.output_count);
        let job = self.api.submit(&request).await?;
        debug!(job = %job, "generation job submitted");
        Ok(job)
    }

    /// Polls `job` until it finishes or the attempt budget runs out.
    ///
    /// Every status check is preceded by the policy interval.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::JobFailed`] on a terminal failure status,
    /// [`GenerationError::MissingOutput`] when success carries no output,
    /// [`GenerationError::TimedOut`] when the budget is exhausted, and
    /// propagates status-check errors.
    #[instrument(skip_all, fields(job = %job))]
    pub async fn poll_until_done(&self, job: &JobHandle) -> GenerationResult<OutputReference> {
        for attempt in 1..=self.policy.attempts() {
            tokio::time::sleep(self.policy.interval()).await;
            let report = self.api.status(job).await?;

            match report.progress() {
                JobProgress::Succeeded => {
                    return extract_output_reference(report.data())
                        .ok_or_else(|| GenerationError::MissingOutput(job.clone()));
                }
                JobProgress::Failed { status } => {
                    warn!(attempt, status, "generation job failed");
                    return Err(GenerationError::JobFailed {
                        job: job.clone(),
                        status,
                    });
                }
                JobProgress::Running => {
                    debug!(attempt, status = ?report.status(), "generation job still running");
                }
            }
        }

        Err(GenerationError::TimedOut {
            job: job.clone(),
            attempts: self.policy.attempts(),
        })
    }

    /// Submits `instruction` and waits for its output.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Self::submit`] and [`Self::poll_until_done`].
    pub async fn generate(&self, instruction: &str) -> GenerationResult<OutputReference> {
        let job = self.submit(instruction).await?;
        self.poll_until_done(&job).await
    }
}
