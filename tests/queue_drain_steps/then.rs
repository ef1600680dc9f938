//! Then steps for queue drain scenarios.

use super::world::{DrainWorld, run_async};
use genqueue::queue::{domain::TaskStatus, services::EntryPointError};
use rstest_bdd_macros::then;

fn expected_status(raw: &str) -> Result<TaskStatus, eyre::Report> {
    TaskStatus::try_from(raw).map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))
}

fn statuses(world: &DrainWorld) -> Vec<TaskStatus> {
    world
        .task_ids
        .iter()
        .map(|id| run_async(world.rig.task(*id)).status())
        .collect()
}

#[then("the chain ran {count:u32} invocations")]
fn chain_ran(world: &DrainWorld, count: u32) -> Result<(), eyre::Report> {
    if u32::try_from(world.reports.len()).ok() != Some(count) {
        return Err(eyre::eyre!(
            "expected {count} invocations, found {}",
            world.reports.len()
        ));
    }
    Ok(())
}

#[then(r#"every task is "{status}""#)]
fn every_task_is(world: &DrainWorld, status: String) -> Result<(), eyre::Report> {
    let expected = expected_status(&status)?;
    let observed = statuses(world);
    if observed.iter().any(|found| *found != expected) {
        return Err(eyre::eyre!("expected every task {expected}, found {observed:?}"));
    }
    Ok(())
}

#[then(r#"{count:u32} tasks are "{status}""#)]
fn tasks_are(world: &DrainWorld, count: u32, status: String) -> Result<(), eyre::Report> {
    let expected = expected_status(&status)?;
    let observed = statuses(world);
    let matching = observed.iter().filter(|found| **found == expected).count();
    if u32::try_from(matching).ok() != Some(count) {
        return Err(eyre::eyre!(
            "expected {count} tasks {expected}, found {observed:?}"
        ));
    }
    Ok(())
}

#[then(r#"the last continuation decision is "{decision}""#)]
fn last_decision(world: &DrainWorld, decision: String) -> Result<(), eyre::Report> {
    let report = world
        .reports
        .last()
        .ok_or_else(|| eyre::eyre!("no invocation ran"))?;
    let encoded = serde_json::to_value(report.continuation)?;
    let found = encoded.get("decision").and_then(serde_json::Value::as_str);
    if found != Some(decision.as_str()) {
        return Err(eyre::eyre!("expected decision {decision}, found {encoded}"));
    }
    Ok(())
}

#[then("the first task has retry count {count:u32}")]
fn first_task_retry_count(world: &DrainWorld, count: u32) -> Result<(), eyre::Report> {
    let id = world
        .task_ids
        .first()
        .ok_or_else(|| eyre::eyre!("no task enqueued"))?;
    let found = run_async(world.rig.task(*id)).retry_count();
    if found != count {
        return Err(eyre::eyre!("expected retry count {count}, found {found}"));
    }
    Ok(())
}

#[then("the invocation is refused by the depth guard")]
fn invocation_refused(world: &DrainWorld) -> Result<(), eyre::Report> {
    match &world.refusal {
        Some(EntryPointError::DepthLimitExceeded { .. }) => Ok(()),
        other => Err(eyre::eyre!("expected depth refusal, found {other:?}")),
    }
}
