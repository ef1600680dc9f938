//! Orchestration services for the generation task queue.

mod continuation;
mod dispatch;
mod drain;
mod entry_point;
mod processor;
mod recovery;

pub use continuation::ContinuationTrigger;
pub use dispatch::{drive_chain, run_dispatcher};
pub use drain::{DrainLoop, DrainStop, DrainSummary};
pub use entry_point::{EntryPointError, EntryPointResult, ProcessInvocation, QueueEntryPoint};
pub use processor::{ProcessingPipeline, ProcessorError, ProcessorResult, TaskProcessor};
pub use recovery::StalledTaskRecovery;
