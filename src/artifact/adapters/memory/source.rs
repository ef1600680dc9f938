//! Artifact source serving preloaded bytes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::artifact::{
    domain::{ArtifactError, ArtifactResult, FetchedArtifact},
    ports::ArtifactSource,
};

/// Serves preloaded artifacts by location; unknown locations answer 404.
#[derive(Debug, Clone, Default)]
pub struct StaticArtifactSource {
    artifacts: Arc<HashMap<String, FetchedArtifact>>,
}

impl StaticArtifactSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a source that also serves `bytes` at `location`.
    #[must_use]
    pub fn with_artifact(
        self,
        location: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
        content_type: Option<&str>,
    ) -> Self {
        let mut artifacts = Arc::unwrap_or_clone(self.artifacts);
        artifacts.insert(
            location.into(),
            FetchedArtifact::new(bytes.into(), content_type.map(ToOwned::to_owned)),
        );
        Self {
            artifacts: Arc::new(artifacts),
        }
    }
}

#[async_trait]
impl ArtifactSource for StaticArtifactSource {
    async fn fetch(&self, location: &str) -> ArtifactResult<FetchedArtifact> {
        self.artifacts
            .get(location)
            .cloned()
            .ok_or_else(|| ArtifactError::UnexpectedStatus {
                location: location.to_owned(),
                status: 404,
            })
    }
}
