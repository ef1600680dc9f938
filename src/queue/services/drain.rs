//! Long-lived drain loop for deployments that keep a process running.

use mockable::Clock;
use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

use super::{ProcessorResult, TaskProcessor};
use crate::queue::{
    domain::{FailureDisposition, TaskOutcome},
    ports::TaskStore,
};

/// Why a drain run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainStop {
    /// No eligible task remained.
    Drained,
    /// Shutdown was requested.
    Shutdown,
}

/// Tally of one drain run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DrainSummary {
    /// Tasks completed.
    pub completed: u64,
    /// Attempts that failed and left the task retryable.
    pub retried: u64,
    /// Attempts that failed permanently.
    pub permanently_failed: u64,
    /// Claims lost to another chain.
    pub claims_lost: u64,
    /// Why the run stopped.
    pub stop: DrainStop,
}

impl DrainSummary {
    const fn empty() -> Self {
        Self {
            completed: 0,
            retried: 0,
            permanently_failed: 0,
            claims_lost: 0,
            stop: DrainStop::Drained,
        }
    }

    fn record(&mut self, outcome: &TaskOutcome) {
        let counter = match outcome {
            TaskOutcome::QueueEmpty => return,
            TaskOutcome::ClaimLost { .. } => &mut self.claims_lost,
            TaskOutcome::Completed { .. } => &mut self.completed,
            TaskOutcome::Failed {
                disposition: FailureDisposition::Retryable,
                ..
            } => &mut self.retried,
            TaskOutcome::Failed {
                disposition: FailureDisposition::Permanent,
                ..
            } => &mut self.permanently_failed,
        };
        *counter = counter.saturating_add(1);
    }

    /// Returns the number of attempts that reached an outcome.
    #[must_use]
    pub const fn attempts(&self) -> u64 {
        self.completed
            .saturating_add(self.retried)
            .saturating_add(self.permanently_failed)
    }
}

/// Runs the processor back to back until no eligible task remains.
///
/// Unlike a self-continuing chain there is no depth counter: retryable
/// failures are picked up again in the same run, and the retry limit bounds
/// how often. Shutdown is checked between tasks; an in-flight task always
/// finishes.
pub struct DrainLoop<R, C>
where
    R: TaskStore,
    C: Clock + Send + Sync,
{
    processor: TaskProcessor<R, C>,
    shutdown: watch::Receiver<bool>,
}

impl<R, C> DrainLoop<R, C>
where
    R: TaskStore,
    C: Clock + Send + Sync,
{
    /// Creates a drain loop stopping once `shutdown` turns `true`.
    #[must_use]
    pub const fn new(processor: TaskProcessor<R, C>, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            processor,
            shutdown,
        }
    }

    /// Drains the queue.
    ///
    /// # Errors
    ///
    /// Propagates processor errors; tasks already handled keep their
    /// recorded outcomes.
    pub async fn run(&self) -> ProcessorResult<DrainSummary> {
        let mut summary = DrainSummary::empty();
        loop {
            if *self.shutdown.borrow() {
                summary.stop = DrainStop::Shutdown;
                break;
            }

            let outcome = self.processor.process_next().await?;
            if outcome == TaskOutcome::QueueEmpty {
                break;
            }
            summary.record(&outcome);
        }

        info!(
            completed = summary.completed,
            retried = summary.retried,
            permanently_failed = summary.permanently_failed,
            claims_lost = summary.claims_lost,
            stop = ?summary.stop,
            "drain finished"
        );
        Ok(summary)
    }
}
