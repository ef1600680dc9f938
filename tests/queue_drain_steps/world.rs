//! Shared world state for queue drain scenarios.

use genqueue::queue::{
    domain::{InvocationReport, TaskId},
    services::EntryPointError,
};
use rstest::fixture;

use crate::test_helpers::QueueRig;

/// Scenario world for queue drain behaviour tests.
pub struct DrainWorld {
    pub rig: QueueRig,
    pub task_ids: Vec<TaskId>,
    pub reports: Vec<InvocationReport>,
    pub refusal: Option<EntryPointError>,
}

impl DrainWorld {
    /// Creates a world over an empty in-memory queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rig: QueueRig::new(),
            task_ids: Vec::new(),
            reports: Vec::new(),
            refusal: None,
        }
    }
}

impl Default for DrainWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> DrainWorld {
    DrainWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
