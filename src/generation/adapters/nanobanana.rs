//! `reqwest` adapter for the Nanobanana image generation API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::generation::{
    domain::{GenerationError, GenerationRequest, GenerationResult, JobHandle, StatusReport},
    ports::GenerationApi,
};

/// Acceptance code the service reports for accepted submissions.
const ACCEPTED_CODE: i64 = 200;

/// Connection settings for [`NanobananaApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NanobananaConfig {
    /// Submission endpoint.
    pub submit_url: String,
    /// Status endpoint, queried with a `taskId` parameter.
    pub status_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Generation type sent with each submission.
    pub generation_type: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Generation service adapter speaking the Nanobanana HTTP contract.
#[derive(Debug, Clone)]
pub struct NanobananaApi {
    client: Client,
    config: NanobananaConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitBody<'a> {
    prompt: &'a str,
    #[serde(rename = "type")]
    generation_type: &'a str,
    num_images: u32,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    code: Option<i64>,
    msg: Option<String>,
    data: Option<Value>,
}

impl NanobananaApi {
    /// Creates an adapter from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Transport`] when the HTTP client cannot be
    /// built.
    pub fn new(config: NanobananaConfig) -> GenerationResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GenerationError::transport)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl GenerationApi for NanobananaApi {
    async fn submit(&self, request: &GenerationRequest) -> GenerationResult<JobHandle> {
        let body = SubmitBody {
            prompt: request.instruction(),
            generation_type: &self.config.generation_type,
            num_images: request.output_count(),
        };
        let response = self
            .client
            .post(&self.config.submit_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(GenerationError::transport)?;

        let http_status = response.status();
        if !http_status.is_success() {
            let reason = response.text().await.unwrap_or_default();
            return Err(GenerationError::SubmissionRejected {
                code: Some(i64::from(http_status.as_u16())),
                reason: if reason.is_empty() {
                    http_status.to_string()
                } else {
                    reason
                },
            });
        }

        let envelope = response
            .json::<Envelope>()
            .await
            .map_err(|err| GenerationError::MalformedResponse(err.to_string()))?;
        if envelope.code != Some(ACCEPTED_CODE) {
            return Err(GenerationError::SubmissionRejected {
                code: envelope.code,
                reason: envelope.msg.unwrap_or_default(),
            });
        }

        envelope
            .data
            .as_ref()
            .and_then(|data| data.get("taskId"))
            .and_then(job_handle_from)
            .ok_or_else(|| {
                GenerationError::MalformedResponse("submission reply has no taskId".to_owned())
            })
    }

    async fn status(&self, job: &JobHandle) -> GenerationResult<StatusReport> {
        let response = self
            .client
            .get(&self.config.status_url)
            .bearer_auth(&self.config.api_key)
            .query(&[("taskId", job.as_str())])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(GenerationError::transport)?;

        let envelope = response
            .json::<Envelope>()
            .await
            .map_err(|err| GenerationError::MalformedResponse(err.to_string()))?;
        let data = envelope
            .data
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        Ok(StatusReport::from_data(data))
    }
}

fn job_handle_from(value: &Value) -> Option<JobHandle> {
    match value {
        Value::String(text) => JobHandle::new(text.as_str()),
        Value::Number(number) => JobHandle::new(number.to_string()),
        _ => None,
    }
}
