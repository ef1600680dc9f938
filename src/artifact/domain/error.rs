//! Error types for artifact fetching and storage.

use std::sync::Arc;
use thiserror::Error;

/// Result type for artifact operations.
pub type ArtifactResult<T> = Result<T, ArtifactError>;

/// Errors returned while materializing an artifact.
#[derive(Debug, Clone, Error)]
pub enum ArtifactError {
    /// The storage path is empty, absolute, or escapes its root.
    #[error("invalid artifact path: {0}")]
    InvalidPath(String),

    /// The output location answered with a non-success status.
    #[error("fetching {location} returned HTTP {status}")]
    UnexpectedStatus {
        /// Location that was fetched.
        location: String,
        /// HTTP status code.
        status: u16,
    },

    /// The output location returned no bytes.
    #[error("artifact at {0} is empty")]
    EmptyBody(String),

    /// The storage rejected the write.
    #[error("artifact storage rejected {path}: {reason}")]
    Rejected {
        /// Path that was written.
        path: String,
        /// Reason reported by the storage.
        reason: String,
    },

    /// The artifact already exists and overwriting was not requested.
    #[error("artifact already exists: {0}")]
    AlreadyExists(String),

    /// Transport or I/O failure while fetching.
    #[error("artifact fetch error: {0}")]
    Fetch(Arc<dyn std::error::Error + Send + Sync>),

    /// Transport or I/O failure while writing.
    #[error("artifact storage error: {0}")]
    Storage(Arc<dyn std::error::Error + Send + Sync>),
}

impl ArtifactError {
    /// Wraps a fetch error.
    pub fn fetch(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Fetch(Arc::new(err))
    }

    /// Wraps a storage error.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Arc::new(err))
    }

    /// Returns a stable label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidPath(_) => "invalid_path",
            Self::UnexpectedStatus { .. } => "fetch_status",
            Self::EmptyBody(_) => "empty_body",
            Self::Rejected { .. } => "storage_rejected",
            Self::AlreadyExists(_) => "already_exists",
            Self::Fetch(_) => "fetch",
            Self::Storage(_) => "storage",
        }
    }
}
