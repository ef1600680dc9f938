//! Bounded polling policy.

use super::{GenerationError, GenerationResult};
use std::time::Duration;

/// Default number of status checks per job.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 6;

/// Default delay preceding each status check.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Number of status checks and the delay before each.
///
/// The worst-case wall time spent polling one job is `attempts * interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    attempts: u32,
    interval: Duration,
}

impl PollPolicy {
    /// Creates a polling policy.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidPollPolicy`] when `attempts` is zero.
    pub const fn new(attempts: u32, interval: Duration) -> GenerationResult<Self> {
        if attempts == 0 {
            return Err(GenerationError::InvalidPollPolicy);
        }
        Ok(Self { attempts, interval })
    }

    /// Returns the number of status checks.
    #[must_use]
    pub const fn attempts(self) -> u32 {
        self.attempts
    }

    /// Returns the delay preceding each status check.
    #[must_use]
    pub const fn interval(self) -> Duration {
        self.interval
    }

    /// Returns the longest time a job may be polled.
    #[must_use]
    pub const fn budget(self) -> Duration {
        self.interval.saturating_mul(self.attempts)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_POLL_ATTEMPTS,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
