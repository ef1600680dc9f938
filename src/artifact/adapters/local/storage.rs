//! Capability-scoped filesystem storage for artifacts.

use std::sync::Arc;

use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;

use crate::artifact::{
    domain::{ArtifactError, ArtifactPath, ArtifactResult},
    ports::ArtifactStorage,
};

/// Writes artifacts below a root directory opened once at construction.
///
/// Every write is resolved relative to the root capability, so paths can
/// never escape it.
#[derive(Debug, Clone)]
pub struct LocalArtifactStorage {
    root: Arc<Dir>,
    public_base_url: String,
}

impl LocalArtifactStorage {
    /// Opens `root`, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Storage`] when the directory cannot be
    /// created or opened.
    pub fn open(root: &Utf8Path, public_base_url: impl Into<String>) -> ArtifactResult<Self> {
        std::fs::create_dir_all(root).map_err(ArtifactError::storage)?;
        let dir = Dir::open_ambient_dir(root, ambient_authority()).map_err(ArtifactError::storage)?;
        Ok(Self::from_dir(dir, public_base_url))
    }

    /// Wraps an already opened directory capability.
    #[must_use]
    pub fn from_dir(root: Dir, public_base_url: impl Into<String>) -> Self {
        Self {
            root: Arc::new(root),
            public_base_url: public_base_url.into(),
        }
    }
}

#[async_trait]
impl ArtifactStorage for LocalArtifactStorage {
    async fn write(
        &self,
        path: &ArtifactPath,
        bytes: &[u8],
        _content_type: &str,
        overwrite: bool,
    ) -> ArtifactResult<String> {
        let root = Arc::clone(&self.root);
        let relative = path.as_str().to_owned();
        let contents = bytes.to_vec();

        tokio::task::spawn_blocking(move || write_file(&root, &relative, &contents, overwrite))
            .await
            .map_err(ArtifactError::storage)??;

        Ok(format!(
            "{}/{path}",
            self.public_base_url.trim_end_matches('/')
        ))
    }
}

fn write_file(root: &Dir, relative: &str, contents: &[u8], overwrite: bool) -> ArtifactResult<()> {
    let target = Utf8Path::new(relative);
    if let Some(parent) = target.parent().filter(|parent| !parent.as_str().is_empty()) {
        root.create_dir_all(parent).map_err(ArtifactError::storage)?;
    }
    if !overwrite && root.exists(target) {
        return Err(ArtifactError::AlreadyExists(relative.to_owned()));
    }
    root.write(target, contents).map_err(ArtifactError::storage)
}
