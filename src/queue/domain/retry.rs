//! Attempt-counting retry policy.

use super::QueueDomainError;
use serde::{Deserialize, Serialize};

/// Default number of attempts a task receives before it is abandoned.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// How a failed attempt leaves the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureDisposition {
    /// The task returns to the `failed` state and stays eligible.
    Retryable,
    /// The task is moved to `permanently_failed`.
    Permanent,
}

impl FailureDisposition {
    /// Returns the prefix written in front of the stored error message.
    #[must_use]
    pub const fn message_prefix(self) -> &'static str {
        match self {
            Self::Retryable => "Retrying",
            Self::Permanent => "Failed",
        }
    }

    /// Returns `true` for [`FailureDisposition::Permanent`].
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        matches!(self, Self::Permanent)
    }
}

/// Bounds the number of attempts per task.
///
/// There is no time-based backoff: the next attempt happens whenever a later
/// invocation selects the task again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    max_retries: u32,
}

impl RetryPolicy {
    /// Creates a policy allowing `max_retries` attempts in total.
    ///
    /// # Errors
    ///
    /// Returns [`QueueDomainError::InvalidRetryLimit`] when `max_retries` is
    /// zero.
    pub const fn new(max_retries: u32) -> Result<Self, QueueDomainError> {
        if max_retries == 0 {
            return Err(QueueDomainError::InvalidRetryLimit);
        }
        Ok(Self { max_retries })
    }

    /// Returns the attempt limit.
    #[must_use]
    pub const fn max_retries(self) -> u32 {
        self.max_retries
    }

    /// Returns `true` while a `failed` task with this retry count may be
    /// selected again.
    #[must_use]
    pub const fn allows_retry(self, retry_count: u32) -> bool {
        retry_count < self.max_retries
    }

    /// Decides how a failure of the given attempt number is recorded.
    #[must_use]
    pub const fn disposition_for(self, attempt: u32) -> FailureDisposition {
        if attempt >= self.max_retries {
            FailureDisposition::Permanent
        } else {
            FailureDisposition::Retryable
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}
