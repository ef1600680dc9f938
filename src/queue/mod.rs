//! Generation task queue with a self-continuing drain.
//!
//! One invocation selects and claims at most one eligible task, drives it
//! through instruction composition, generation and materialization, records
//! the outcome, then asks for the next invocation while pending work remains
//! and the chain is shorter than its depth limit. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
