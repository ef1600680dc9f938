//! Port for downloading generation outputs.

use crate::artifact::domain::{ArtifactResult, FetchedArtifact};
use async_trait::async_trait;

/// Downloads the bytes behind an output location.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    /// Fetches the artifact at `location`.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedStatus`, `EmptyBody` or `Fetch` when the bytes
    /// cannot be obtained.
    async fn fetch(&self, location: &str) -> ArtifactResult<FetchedArtifact>;
}
