//! Fetched and stored artifact values.

use super::ArtifactPath;
use sha2::{Digest, Sha256};

/// Bytes downloaded from a generation output location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedArtifact {
    bytes: Vec<u8>,
    content_type: Option<String>,
}

impl FetchedArtifact {
    /// Creates a fetched artifact.
    #[must_use]
    pub const fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            bytes,
            content_type,
        }
    }

    /// Returns the downloaded bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the content type reported by the source.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }
}

/// Artifact written to durable storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    reference: String,
    path: ArtifactPath,
    content_type: String,
    checksum: String,
    size: usize,
}

impl StoredArtifact {
    /// Describes an artifact stored at `path` and reachable at `reference`.
    #[must_use]
    pub fn new(reference: String, path: ArtifactPath, content_type: String, bytes: &[u8]) -> Self {
        Self {
            reference,
            path,
            content_type,
            checksum: sha256_hex(bytes),
            size: bytes.len(),
        }
    }

    /// Returns the durable public reference.
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Returns the storage path.
    #[must_use]
    pub const fn path(&self) -> &ArtifactPath {
        &self.path
    }

    /// Returns the stored content type.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Returns the lowercase hex SHA-256 digest of the stored bytes.
    #[must_use]
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Returns the stored size in bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }
}

/// Returns the lowercase hex SHA-256 digest of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .flat_map(|byte| [byte >> 4, byte & 0x0f])
        .filter_map(|nibble| char::from_digit(u32::from(nibble), 16))
        .collect()
}
