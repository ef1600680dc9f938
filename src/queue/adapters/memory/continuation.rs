//! In-process continuation schedulers.

use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::queue::{
    domain::QueueDepth,
    ports::{ContinuationError, ContinuationResult, ContinuationScheduler},
};

/// Receiving half paired with a [`ChannelContinuation`].
pub type ContinuationReceiver = mpsc::UnboundedReceiver<QueueDepth>;

/// Hands continuation requests to an in-process dispatcher over a channel.
#[derive(Debug, Clone)]
pub struct ChannelContinuation {
    sender: mpsc::UnboundedSender<QueueDepth>,
}

impl ChannelContinuation {
    /// Creates a scheduler and the receiver its dispatcher reads from.
    #[must_use]
    pub fn channel() -> (Self, ContinuationReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ContinuationScheduler for ChannelContinuation {
    fn schedule(&self, next_depth: QueueDepth) -> ContinuationResult<()> {
        self.sender
            .send(next_depth)
            .map_err(|_| ContinuationError::Closed)
    }
}

/// Records requested depths without invoking anything.
#[derive(Debug, Clone, Default)]
pub struct RecordingContinuation {
    requested: Arc<Mutex<Vec<QueueDepth>>>,
    refuse: bool,
}

impl RecordingContinuation {
    /// Creates a recorder that accepts every request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recorder that refuses every request as if its dispatcher
    /// were gone.
    #[must_use]
    pub fn refusing() -> Self {
        Self {
            requested: Arc::default(),
            refuse: true,
        }
    }

    /// Returns the depths requested so far, in order.
    #[must_use]
    pub fn requested(&self) -> Vec<QueueDepth> {
        self.requested
            .lock()
            .map(|requested| requested.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl ContinuationScheduler for RecordingContinuation {
    fn schedule(&self, next_depth: QueueDepth) -> ContinuationResult<()> {
        if self.refuse {
            return Err(ContinuationError::Closed);
        }
        let mut requested = self
            .requested
            .lock()
            .map_err(|err| ContinuationError::transport(std::io::Error::other(err.to_string())))?;
        requested.push(next_depth);
        Ok(())
    }
}
