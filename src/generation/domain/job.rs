//! Job handles, requests and output references.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier the generation service assigned to a submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    /// Creates a job handle, returning `None` for blank identifiers.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let handle = value.into();
        if handle.trim().is_empty() {
            return None;
        }
        Some(Self(handle))
    }

    /// Returns the handle as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Location of a finished job's output, as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputReference(String);

impl OutputReference {
    /// Creates an output reference, returning `None` for empty values.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let location = value.into();
        if location.is_empty() {
            return None;
        }
        Some(Self(location))
    }

    /// Returns the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OutputReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Work submitted to the generation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    instruction: String,
    output_count: u32,
}

impl GenerationRequest {
    /// Creates a request for `output_count` outputs of `instruction`.
    #[must_use]
    pub fn new(instruction: impl Into<String>, output_count: u32) -> Self {
        Self {
            instruction: instruction.into(),
            output_count,
        }
    }

    /// Returns the instruction text.
    #[must_use]
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Returns the number of outputs requested.
    #[must_use]
    pub const fn output_count(&self) -> u32 {
        self.output_count
    }
}
