//! Fetches generation outputs and persists them durably.

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, instrument};

use crate::artifact::{
    domain::{
        ArtifactError, ArtifactName, ArtifactPath, ArtifactResult, DEFAULT_CONTENT_TYPE,
        DEFAULT_PATH_PREFIX, StoredArtifact, extension_for, resolve_content_type,
    },
    ports::{ArtifactSource, ArtifactStorage},
};

/// Path and content-type settings for [`ResultMaterializer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializerSettings {
    /// Leading path segment of every artifact.
    pub path_prefix: String,
    /// Content type used when the fetched one is not an image type.
    pub default_content_type: String,
}

impl Default for MaterializerSettings {
    fn default() -> Self {
        Self {
            path_prefix: DEFAULT_PATH_PREFIX.to_owned(),
            default_content_type: DEFAULT_CONTENT_TYPE.to_owned(),
        }
    }
}

/// Turns a generation output location into a stored artifact.
pub struct ResultMaterializer<S, W, C>
where
    S: ArtifactSource + ?Sized,
    W: ArtifactStorage + ?Sized,
    C: Clock + Send + Sync,
{
    source: Arc<S>,
    storage: Arc<W>,
    clock: Arc<C>,
    settings: MaterializerSettings,
}

impl<S, W, C> ResultMaterializer<S, W, C>
where
    S: ArtifactSource + ?Sized,
    W: ArtifactStorage + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a materializer.
    #[must_use]
    pub const fn new(
        source: Arc<S>,
        storage: Arc<W>,
        clock: Arc<C>,
        settings: MaterializerSettings,
    ) -> Self {
        Self {
            source,
            storage,
            clock,
            settings,
        }
    }

    /// Fetches `location` and stores it under a path derived from
    /// `task_name`, overwriting any previous object at that path.
    ///
    /// # Errors
    ///
    /// Propagates fetch and storage errors.
    #[instrument(skip_all, fields(location = %location, task_name = %task_name))]
    pub async fn materialize(
        &self,
        location: &str,
        task_name: &str,
    ) -> ArtifactResult<StoredArtifact> {
        let fetched = self.source.fetch(location).await?;
        if fetched.bytes().is_empty() {
            return Err(ArtifactError::EmptyBody(location.to_owned()));
        }

        let content_type = resolve_content_type(
            fetched.content_type(),
            &self.settings.default_content_type,
        );
        let path = ArtifactPath::for_artifact(
            &self.settings.path_prefix,
            &ArtifactName::sanitize(task_name),
            self.clock.utc().timestamp_millis(),
            extension_for(&content_type),
        )?;

        let reference = self
            .storage
            .write(&path, fetched.bytes(), &content_type, true)
            .await?;
        let stored = StoredArtifact::new(reference, path, content_type, fetched.bytes());
        debug!(
            path = %stored.path(),
            size = stored.size(),
            checksum = stored.checksum(),
            "artifact stored"
        );
        Ok(stored)
    }
}
