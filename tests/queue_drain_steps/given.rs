//! Given steps for queue drain scenarios.

use super::world::{DrainWorld, run_async};
use rstest_bdd_macros::given;

#[given("a depth limit of {limit:u32}")]
fn depth_limit(world: &mut DrainWorld, limit: u32) {
    world.rig = world.rig.clone().with_max_depth(limit);
}

#[given("{count:u32} pending tasks")]
fn pending_tasks(world: &mut DrainWorld, count: u32) {
    for index in 0..count {
        let id = run_async(world.rig.enqueue(&format!("Relay Leg {index}")));
        world.task_ids.push(id);
    }
}

#[given("the generation service completes {count:u32} jobs")]
fn service_completes_jobs(world: &mut DrainWorld, count: u32) {
    for index in 0..count {
        world.rig.script_success(&format!("job-{index}"));
    }
}

#[given("the generation service rejects every job")]
fn service_rejects_jobs(world: &DrainWorld) {
    // Unscripted submissions are rejected by the scripted service.
    assert!(world.rig.api.submitted().is_empty());
}
