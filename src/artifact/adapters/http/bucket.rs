//! Object bucket storage over the Supabase storage HTTP contract.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::CONTENT_TYPE};

use crate::artifact::{
    domain::{ArtifactError, ArtifactPath, ArtifactResult},
    ports::ArtifactStorage,
};

/// Connection settings for [`HttpBucketStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpBucketConfig {
    /// Base URL of the storage service.
    pub base_url: String,
    /// Target bucket.
    pub bucket: String,
    /// Service key sent as a bearer token.
    pub service_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Uploads artifacts to a public object bucket.
#[derive(Debug, Clone)]
pub struct HttpBucketStorage {
    client: Client,
    config: HttpBucketConfig,
}

impl HttpBucketStorage {
    /// Creates bucket storage from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Storage`] when the HTTP client cannot be
    /// built.
    pub fn new(config: HttpBucketConfig) -> ArtifactResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ArtifactError::storage)?;
        Ok(Self { client, config })
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// Returns the upload URL for `path`.
    #[must_use]
    pub fn object_url(&self, path: &ArtifactPath) -> String {
        format!(
            "{}/storage/v1/object/{}/{path}",
            self.base(),
            self.config.bucket
        )
    }

    /// Returns the public URL for `path`.
    #[must_use]
    pub fn public_url(&self, path: &ArtifactPath) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{path}",
            self.base(),
            self.config.bucket
        )
    }
}

#[async_trait]
impl ArtifactStorage for HttpBucketStorage {
    async fn write(
        &self,
        path: &ArtifactPath,
        bytes: &[u8],
        content_type: &str,
        overwrite: bool,
    ) -> ArtifactResult<String> {
        let response = self
            .client
            .post(self.object_url(path))
            .bearer_auth(&self.config.service_key)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", if overwrite { "true" } else { "false" })
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(ArtifactError::storage)?;

        let status = response.status();
        if status == StatusCode::CONFLICT && !overwrite {
            return Err(ArtifactError::AlreadyExists(path.to_string()));
        }
        if !status.is_success() {
            let reason = response.text().await.unwrap_or_default();
            return Err(ArtifactError::Rejected {
                path: path.to_string(),
                reason: if reason.is_empty() {
                    status.to_string()
                } else {
                    reason
                },
            });
        }
        Ok(self.public_url(path))
    }
}
