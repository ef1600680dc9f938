//! Artifact storage kept in process memory.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::artifact::{
    domain::{ArtifactError, ArtifactPath, ArtifactResult},
    ports::ArtifactStorage,
};

/// Object held by [`InMemoryArtifactStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Stored bytes.
    pub bytes: Vec<u8>,
    /// Stored content type.
    pub content_type: String,
}

/// Thread-safe in-memory artifact storage.
#[derive(Debug, Clone)]
pub struct InMemoryArtifactStorage {
    public_base_url: String,
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
}

impl InMemoryArtifactStorage {
    /// Creates empty storage whose references start with `public_base_url`.
    #[must_use]
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            public_base_url: public_base_url.into(),
            objects: Arc::default(),
        }
    }

    /// Returns the object stored at `path`, if any.
    #[must_use]
    pub fn object(&self, path: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .ok()
            .and_then(|objects| objects.get(path).cloned())
    }

    /// Returns every stored path in order.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.objects
            .read()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ArtifactStorage for InMemoryArtifactStorage {
    async fn write(
        &self,
        path: &ArtifactPath,
        bytes: &[u8],
        content_type: &str,
        overwrite: bool,
    ) -> ArtifactResult<String> {
        let mut objects = self
            .objects
            .write()
            .map_err(|err| ArtifactError::storage(std::io::Error::other(err.to_string())))?;
        if !overwrite && objects.contains_key(path.as_str()) {
            return Err(ArtifactError::AlreadyExists(path.to_string()));
        }
        objects.insert(
            path.as_str().to_owned(),
            StoredObject {
                bytes: bytes.to_vec(),
                content_type: content_type.to_owned(),
            },
        );
        Ok(format!(
            "{}/{path}",
            self.public_base_url.trim_end_matches('/')
        ))
    }
}
