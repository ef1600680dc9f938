//! Decides whether a chain continues after an invocation handled a task.

use std::sync::Arc;

use tracing::{info, warn};

use crate::queue::{
    domain::{ContinuationDecision, QueueDepth},
    ports::{ContinuationScheduler, TaskStore},
};

/// Requests the next invocation while pending work remains and the chain is
/// shorter than its depth limit.
pub struct ContinuationTrigger<R, S>
where
    R: TaskStore,
    S: ContinuationScheduler + ?Sized,
{
    store: Arc<R>,
    scheduler: Arc<S>,
    max_depth: QueueDepth,
}

impl<R, S> ContinuationTrigger<R, S>
where
    R: TaskStore,
    S: ContinuationScheduler + ?Sized,
{
    /// Creates a trigger that never schedules beyond `max_depth`.
    #[must_use]
    pub const fn new(store: Arc<R>, scheduler: Arc<S>, max_depth: QueueDepth) -> Self {
        Self {
            store,
            scheduler,
            max_depth,
        }
    }

    /// Returns the depth limit.
    #[must_use]
    pub const fn max_depth(&self) -> QueueDepth {
        self.max_depth
    }

    /// Continues the chain from an invocation that ran at `depth`.
    ///
    /// Count and scheduling failures are logged and reported in the
    /// decision, never returned as errors.
    pub async fn continue_chain(&self, depth: QueueDepth) -> ContinuationDecision {
        let remaining = match self.store.count_eligible_pending().await {
            Ok(remaining) => remaining,
            Err(err) => {
                warn!(
                    depth = depth.value(),
                    error = %err,
                    "pending count unavailable, chain stops"
                );
                return ContinuationDecision::CountUnavailable;
            }
        };

        if remaining == 0 {
            info!(depth = depth.value(), "queue drained");
            return ContinuationDecision::Drained;
        }

        if depth >= self.max_depth {
            warn!(
                depth = depth.value(),
                max_depth = self.max_depth.value(),
                remaining,
                "depth limit reached with work remaining"
            );
            return ContinuationDecision::DepthLimitReached { remaining };
        }

        let next_depth = depth.next();
        self.scheduler.schedule(next_depth).map_or_else(
            |err| {
                warn!(
                    next_depth = next_depth.value(),
                    remaining,
                    error = %err,
                    "continuation could not be scheduled"
                );
                ContinuationDecision::ScheduleFailed { remaining }
            },
            |()| {
                info!(next_depth = next_depth.value(), remaining, "continuation scheduled");
                ContinuationDecision::Scheduled {
                    next_depth,
                    remaining,
                }
            },
        )
    }
}
