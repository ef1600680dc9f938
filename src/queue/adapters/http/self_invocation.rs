//! Continuation by HTTP self-invocation of the processing endpoint.

use std::time::Duration;

use reqwest::Client;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::queue::{
    domain::QueueDepth,
    ports::{ContinuationError, ContinuationResult, ContinuationScheduler},
};

/// Request header carrying the depth of an invocation.
pub const DEPTH_HEADER: &str = "x-recursion-depth";

/// Requests the next invocation by posting to the processing endpoint.
///
/// The request runs on a detached task; its response is logged and
/// otherwise ignored.
#[derive(Debug, Clone)]
pub struct HttpSelfInvocation {
    client: Client,
    endpoint: String,
    bearer_token: Option<String>,
}

impl HttpSelfInvocation {
    /// Creates a scheduler posting to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`ContinuationError::Transport`] when the HTTP client cannot
    /// be built.
    pub fn new(
        endpoint: impl Into<String>,
        bearer_token: Option<String>,
        timeout: Duration,
    ) -> ContinuationResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ContinuationError::transport)?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            bearer_token,
        })
    }

    /// Returns the endpoint continuations are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, next_depth: QueueDepth) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(DEPTH_HEADER, next_depth.to_string())
            .json(&serde_json::json!({}));
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }
        request
    }
}

impl ContinuationScheduler for HttpSelfInvocation {
    fn schedule(&self, next_depth: QueueDepth) -> ContinuationResult<()> {
        let handle = Handle::try_current().map_err(|_| ContinuationError::NoRuntime)?;
        let request = self.request(next_depth);
        let endpoint = self.endpoint.clone();

        handle.spawn(async move {
            match request.send().await {
                Ok(response) if response.status().is_success() => debug!(
                    %endpoint,
                    depth = next_depth.value(),
                    status = response.status().as_u16(),
                    "continuation request delivered"
                ),
                Ok(response) => warn!(
                    %endpoint,
                    depth = next_depth.value(),
                    status = response.status().as_u16(),
                    "continuation request answered with an error status"
                ),
                Err(err) => warn!(
                    %endpoint,
                    depth = next_depth.value(),
                    error = %err,
                    "continuation request failed"
                ),
            }
        });
        Ok(())
    }
}
