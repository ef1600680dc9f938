//! Port for durable artifact storage.

use crate::artifact::domain::{ArtifactPath, ArtifactResult};
use async_trait::async_trait;

/// Durable object storage with publicly resolvable references.
#[async_trait]
pub trait ArtifactStorage: Send + Sync {
    /// Writes `bytes` at `path` and returns the public reference.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` when the path is taken and `overwrite` is
    /// false, `Rejected` or `Storage` when the write fails.
    async fn write(
        &self,
        path: &ArtifactPath,
        bytes: &[u8],
        content_type: &str,
        overwrite: bool,
    ) -> ArtifactResult<String>;
}
