//! Filesystem-safe artifact names.

use std::fmt;

/// Name segment derived from a task's human-readable name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactName(String);

impl ArtifactName {
    /// Name used when sanitation leaves nothing.
    pub const FALLBACK: &'static str = "unnamed";

    /// Sanitizes `raw` into a path segment.
    ///
    /// Characters other than ASCII alphanumerics, whitespace, `-` and `_` are
    /// dropped; the rest is trimmed and each whitespace run becomes one `_`.
    #[must_use]
    pub fn sanitize(raw: &str) -> Self {
        let kept: String = raw
            .chars()
            .filter(|ch| {
                ch.is_ascii_alphanumeric() || ch.is_whitespace() || matches!(ch, '-' | '_')
            })
            .collect();
        let joined = kept.split_whitespace().collect::<Vec<_>>().join("_");
        if joined.is_empty() {
            return Self(Self::FALLBACK.to_owned());
        }
        Self(joined)
    }

    /// Returns the sanitized name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
