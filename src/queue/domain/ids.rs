//! Identifier and validated scalar types for the queue domain.

use super::QueueDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identifier of a generation task.
///
/// Identifiers order tasks deterministically when the selection criteria
/// tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    /// Creates a validated task identifier.
    ///
    /// # Errors
    ///
    /// Returns [`QueueDomainError::InvalidTaskId`] when the value is zero or
    /// negative.
    pub const fn new(value: i64) -> Result<Self, QueueDomainError> {
        if value <= 0 {
            return Err(QueueDomainError::InvalidTaskId(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Correlation identifier attached to one entry-point invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Creates a new random invocation identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of an invocation within a self-continuing chain.
///
/// The externally triggered invocation has depth zero and every
/// continuation it schedules carries the next depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueDepth(u32);

impl QueueDepth {
    /// Depth of an externally triggered invocation.
    pub const ROOT: Self = Self(0);

    /// Chain length limit used when none is configured.
    pub const DEFAULT_LIMIT: Self = Self(5);

    /// Creates a depth from a raw counter.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw counter.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns the depth carried by the continuation of this invocation.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Parses a depth indicator, defaulting to [`QueueDepth::ROOT`] when the
    /// indicator is absent or blank.
    ///
    /// # Errors
    ///
    /// Returns [`QueueDomainError::InvalidDepth`] when the indicator is not a
    /// non-negative integer.
    pub fn parse_indicator(raw: Option<&str>) -> Result<Self, QueueDomainError> {
        let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
            return Ok(Self::ROOT);
        };
        value
            .parse::<u32>()
            .map(Self)
            .map_err(|_| QueueDomainError::InvalidDepth(value.to_owned()))
    }
}

impl fmt::Display for QueueDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
