//! Genqueue: a self-continuing drain for a backlog of generation tasks.
//!
//! Each invocation claims at most one eligible task, drives it through an
//! external asynchronous generation service, stores the produced artifact
//! durably and records the outcome, then schedules the next invocation while
//! pending work remains and the chain is under its depth limit.
//!
//! # Architecture
//!
//! Genqueue follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, HTTP, etc.)
//!
//! # Modules
//!
//! - [`queue`]: Task store, processor state machine and continuation
//! - [`generation`]: Submission and bounded polling of generation jobs
//! - [`artifact`]: Durable storage of generation outputs
//! - [`prompt`]: Instruction composition from task payloads
//! - [`server`]: HTTP processing entry point
//! - [`config`] and [`logging`]: Runtime settings and tracing setup

pub mod artifact;
pub mod config;
pub mod generation;
pub mod logging;
pub mod prompt;
pub mod queue;
pub mod server;

#[cfg(test)]
mod test_support;
