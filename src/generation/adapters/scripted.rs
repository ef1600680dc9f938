//! Scripted generation service for tests and local runs.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::json;

use crate::generation::{
    domain::{GenerationError, GenerationRequest, GenerationResult, JobHandle, StatusReport},
    ports::GenerationApi,
};

#[derive(Debug, Default)]
struct Script {
    submissions: VecDeque<GenerationResult<JobHandle>>,
    statuses: VecDeque<GenerationResult<StatusReport>>,
    submitted: Vec<GenerationRequest>,
    status_checks: u32,
}

/// Generation service that replays queued replies in order.
///
/// Once the submission replies run out every submission is rejected; once
/// the status replies run out every check reports the job as running.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGenerationApi {
    script: Arc<Mutex<Script>>,
}

impl ScriptedGenerationApi {
    /// Creates a service with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a service that accepts one job and reports it finished with
    /// `output` on the first check.
    #[must_use]
    pub fn succeeding(job: &str, output: &str) -> Self {
        let api = Self::new();
        api.push_job(job);
        api.push_status_data(json!({"status": 1, "resultImageUrl": output}));
        api
    }

    /// Queues a submission reply.
    pub fn push_submission(&self, reply: GenerationResult<JobHandle>) {
        self.with_script(|script| script.submissions.push_back(reply));
    }

    /// Queues an accepted submission with handle `job`.
    pub fn push_job(&self, job: &str) {
        let reply = JobHandle::new(job)
            .ok_or_else(|| GenerationError::MalformedResponse("blank job handle".to_owned()));
        self.push_submission(reply);
    }

    /// Queues a status reply.
    pub fn push_status(&self, reply: GenerationResult<StatusReport>) {
        self.with_script(|script| script.statuses.push_back(reply));
    }

    /// Queues a status reply built from a raw data object.
    pub fn push_status_data(&self, data: serde_json::Value) {
        self.push_status(Ok(StatusReport::from_data(data)));
    }

    /// Returns every request submitted so far.
    #[must_use]
    pub fn submitted(&self) -> Vec<GenerationRequest> {
        self.with_script(|script| script.submitted.clone())
    }

    /// Returns the number of status checks performed so far.
    #[must_use]
    pub fn status_checks(&self) -> u32 {
        self.with_script(|script| script.status_checks)
    }

    fn with_script<T>(&self, apply: impl FnOnce(&mut Script) -> T) -> T {
        let mut guard: MutexGuard<'_, Script> = self
            .script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        apply(&mut guard)
    }
}

#[async_trait]
impl GenerationApi for ScriptedGenerationApi {
    async fn submit(&self, request: &GenerationRequest) -> GenerationResult<JobHandle> {
        self.with_script(|script| {
            script.submitted.push(request.clone());
            script.submissions.pop_front().unwrap_or_else(|| {
                Err(GenerationError::SubmissionRejected {
                    code: None,
                    reason: "no scripted submission".to_owned(),
                })
            })
        })
    }

    async fn status(&self, _job: &JobHandle) -> GenerationResult<StatusReport> {
        self.with_script(|script| {
            script.status_checks = script.status_checks.saturating_add(1);
            script
                .statuses
                .pop_front()
                .unwrap_or_else(|| Ok(StatusReport::from_data(json!({}))))
        })
    }
}
