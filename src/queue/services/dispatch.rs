//! In-process dispatch of channel continuations.

use tracing::{info, warn};

use super::ProcessInvocation;
use crate::queue::{
    adapters::memory::ContinuationReceiver,
    domain::{InvocationReport, QueueDepth},
};

/// Serves continuation requests until every sender is dropped.
///
/// Invocations run one after another; failures are logged and do not stop
/// the dispatcher. Returns the number of invocations served.
pub async fn run_dispatcher<E>(entry: &E, mut receiver: ContinuationReceiver) -> u64
where
    E: ProcessInvocation + ?Sized,
{
    let mut served: u64 = 0;
    while let Some(depth) = receiver.recv().await {
        served = served.saturating_add(1);
        if let Err(err) = entry.invoke(depth).await {
            warn!(depth = depth.value(), error = %err, "continued invocation failed");
        }
    }
    info!(served, "continuation dispatcher stopped");
    served
}

/// Runs one invocation at `depth`, then every continuation it schedules,
/// until the chain stops.
///
/// Returns the report of every invocation that produced one, in order.
/// Failed invocations are logged and end the chain.
pub async fn drive_chain<E>(
    entry: &E,
    receiver: &mut ContinuationReceiver,
    depth: QueueDepth,
) -> Vec<InvocationReport>
where
    E: ProcessInvocation + ?Sized,
{
    let mut reports = Vec::new();
    let mut next = Some(depth);
    while let Some(current) = next.take() {
        match entry.invoke(current).await {
            Ok(report) => reports.push(report),
            Err(err) => {
                warn!(depth = current.value(), error = %err, "invocation failed, chain stops");
                break;
            }
        }
        next = receiver.try_recv().ok();
    }
    reports
}
