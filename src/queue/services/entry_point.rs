//! Processing entry point: depth guard, one task, continuation, report.

use async_trait::async_trait;
use mockable::Clock;
use thiserror::Error;
use tracing::{Instrument, info, info_span, warn};

use super::{ContinuationTrigger, ProcessorError, TaskProcessor};
use crate::queue::{
    domain::{ContinuationDecision, InvocationId, InvocationReport, QueueDepth},
    ports::{ContinuationScheduler, TaskStore},
};

/// Errors returned by one entry-point invocation.
#[derive(Debug, Error)]
pub enum EntryPointError {
    /// The invocation arrived at or beyond the depth limit; nothing was
    /// touched.
    #[error("queue depth {depth} reached the limit of {max_depth}")]
    DepthLimitExceeded {
        /// Depth carried by the invocation.
        depth: QueueDepth,
        /// Configured limit.
        max_depth: QueueDepth,
    },

    /// The processor could not run or record its outcome.
    #[error(transparent)]
    Processing(#[from] ProcessorError),
}

/// Result type for entry-point invocations.
pub type EntryPointResult<T> = Result<T, EntryPointError>;

/// Anything that can serve one processing invocation.
#[async_trait]
pub trait ProcessInvocation: Send + Sync {
    /// Runs one invocation at `depth`.
    ///
    /// # Errors
    ///
    /// Returns [`EntryPointError`] when the depth guard trips or processing
    /// fails before an outcome is recorded.
    async fn invoke(&self, depth: QueueDepth) -> EntryPointResult<InvocationReport>;
}

/// Entry point combining the processor with the continuation trigger.
pub struct QueueEntryPoint<R, C, S>
where
    R: TaskStore,
    C: Clock + Send + Sync,
    S: ContinuationScheduler + ?Sized,
{
    processor: TaskProcessor<R, C>,
    trigger: ContinuationTrigger<R, S>,
}

impl<R, C, S> QueueEntryPoint<R, C, S>
where
    R: TaskStore,
    C: Clock + Send + Sync,
    S: ContinuationScheduler + ?Sized,
{
    /// Creates an entry point. The trigger's depth limit also guards entry.
    #[must_use]
    pub const fn new(processor: TaskProcessor<R, C>, trigger: ContinuationTrigger<R, S>) -> Self {
        Self { processor, trigger }
    }

    /// Returns the depth limit.
    #[must_use]
    pub const fn max_depth(&self) -> QueueDepth {
        self.trigger.max_depth()
    }

    async fn run(
        &self,
        invocation_id: InvocationId,
        depth: QueueDepth,
    ) -> EntryPointResult<InvocationReport> {
        let max_depth = self.trigger.max_depth();
        if depth >= max_depth {
            warn!(
                depth = depth.value(),
                max_depth = max_depth.value(),
                "invocation rejected by depth guard"
            );
            return Err(EntryPointError::DepthLimitExceeded { depth, max_depth });
        }

        info!(depth = depth.value(), "processing invocation");
        let outcome = self.processor.process_next().await?;
        let continuation = if outcome.triggers_continuation() {
            self.trigger.continue_chain(depth).await
        } else {
            ContinuationDecision::NotAttempted
        };

        Ok(InvocationReport {
            invocation_id,
            depth,
            outcome,
            continuation,
        })
    }
}

#[async_trait]
impl<R, C, S> ProcessInvocation for QueueEntryPoint<R, C, S>
where
    R: TaskStore,
    C: Clock + Send + Sync,
    S: ContinuationScheduler + ?Sized,
{
    async fn invoke(&self, depth: QueueDepth) -> EntryPointResult<InvocationReport> {
        let invocation_id = InvocationId::new();
        let span = info_span!(
            "invocation",
            invocation_id = %invocation_id,
            depth = depth.value()
        );
        self.run(invocation_id, depth).instrument(span).await
    }
}
