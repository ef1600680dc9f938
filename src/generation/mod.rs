//! External asynchronous generation for queued tasks.
//!
//! A task's instruction is submitted once to the generation service, then
//! polled within a fixed attempt budget until the job reports an output, a
//! terminal failure, or runs out of time. The module follows hexagonal
//! architecture:
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
