//! Relative storage paths for artifacts.

use super::{ArtifactError, ArtifactName, ArtifactResult};
use std::fmt;

/// Prefix under which artifacts are grouped by default.
pub const DEFAULT_PATH_PREFIX: &str = "events";

/// Validated relative storage path.
///
/// Paths use `/` separators, never start with `/` and never contain empty,
/// `.` or `..` segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactPath(String);

impl ArtifactPath {
    /// Validates a raw relative path.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::InvalidPath`] when the path is not a clean
    /// relative path.
    pub fn new(raw: impl Into<String>) -> ArtifactResult<Self> {
        let path = raw.into();
        let is_clean = !path.is_empty()
            && path
                .split('/')
                .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
        if !is_clean {
            return Err(ArtifactError::InvalidPath(path));
        }
        Ok(Self(path))
    }

    /// Builds `{prefix}/{name}/{unix_millis}.{extension}`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::InvalidPath`] when `prefix` is not a clean
    /// relative path.
    pub fn for_artifact(
        prefix: &str,
        name: &ArtifactName,
        unix_millis: i64,
        extension: &str,
    ) -> ArtifactResult<Self> {
        let trimmed = prefix.trim_matches('/');
        Self::new(format!("{trimmed}/{name}/{unix_millis}.{extension}"))
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
