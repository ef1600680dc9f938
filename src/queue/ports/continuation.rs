//! Scheduler port used to continue a processing chain.

use crate::queue::domain::QueueDepth;
use std::sync::Arc;
use thiserror::Error;

/// Result type for continuation scheduling.
pub type ContinuationResult<T> = Result<T, ContinuationError>;

/// Requests the next invocation of the processing entry point.
///
/// Implementations must return without waiting for the requested
/// invocation; its outcome is never reported back to the caller.
pub trait ContinuationScheduler: Send + Sync {
    /// Requests an invocation carrying `next_depth`.
    ///
    /// # Errors
    ///
    /// Returns [`ContinuationError`] only when the request could not be
    /// handed off at all.
    fn schedule(&self, next_depth: QueueDepth) -> ContinuationResult<()>;
}

/// Errors returned while handing off a continuation.
#[derive(Debug, Clone, Error)]
pub enum ContinuationError {
    /// The in-process dispatcher is no longer running.
    #[error("continuation dispatcher is closed")]
    Closed,

    /// No async runtime is available to run the request.
    #[error("no async runtime available to schedule continuation")]
    NoRuntime,

    /// Transport-level failure while handing off the request.
    #[error("continuation transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl ContinuationError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
