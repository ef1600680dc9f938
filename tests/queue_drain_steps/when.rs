//! When steps for queue drain scenarios.

use std::sync::Arc;

use super::world::{DrainWorld, run_async};
use genqueue::queue::{
    adapters::memory::{ChannelContinuation, RecordingContinuation},
    domain::QueueDepth,
    services::{ProcessInvocation, drive_chain},
};
use rstest_bdd_macros::when;

#[when("the chain starts at depth {depth:u32}")]
fn chain_starts(world: &mut DrainWorld, depth: u32) {
    let (scheduler, mut receiver) = ChannelContinuation::channel();
    let entry = world.rig.entry_point(Arc::new(scheduler));
    world.reports = run_async(drive_chain(&entry, &mut receiver, QueueDepth::new(depth)));
}

#[when("{count:u32} invocations run at depth {depth:u32}")]
fn invocations_run(world: &mut DrainWorld, count: u32, depth: u32) -> Result<(), eyre::Report> {
    let entry = world.rig.entry_point(Arc::new(RecordingContinuation::new()));
    for _ in 0..count {
        let report = run_async(entry.invoke(QueueDepth::new(depth)))
            .map_err(|err| eyre::eyre!("invocation failed: {err}"))?;
        world.reports.push(report);
    }
    Ok(())
}

#[when("one invocation runs at depth {depth:u32}")]
fn one_invocation_runs(world: &mut DrainWorld, depth: u32) {
    let entry = world.rig.entry_point(Arc::new(RecordingContinuation::new()));
    match run_async(entry.invoke(QueueDepth::new(depth))) {
        Ok(report) => world.reports.push(report),
        Err(err) => world.refusal = Some(err),
    }
}
