//! Downloads generation outputs over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header::CONTENT_TYPE};

use crate::artifact::{
    domain::{ArtifactError, ArtifactResult, FetchedArtifact},
    ports::ArtifactSource,
};

/// `reqwest`-backed artifact source.
#[derive(Debug, Clone)]
pub struct HttpArtifactSource {
    client: Client,
}

impl HttpArtifactSource {
    /// Creates a source with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Fetch`] when the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> ArtifactResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ArtifactError::fetch)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ArtifactSource for HttpArtifactSource {
    async fn fetch(&self, location: &str) -> ArtifactResult<FetchedArtifact> {
        let response = self
            .client
            .get(location)
            .send()
            .await
            .map_err(ArtifactError::fetch)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArtifactError::UnexpectedStatus {
                location: location.to_owned(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned);
        let bytes = response.bytes().await.map_err(ArtifactError::fetch)?;
        if bytes.is_empty() {
            return Err(ArtifactError::EmptyBody(location.to_owned()));
        }
        Ok(FetchedArtifact::new(bytes.to_vec(), content_type))
    }
}
