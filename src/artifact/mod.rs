//! Durable storage of generation outputs.
//!
//! A finished job's output location is downloaded, named after its task,
//! written to storage with overwrite enabled and returned as a public
//! reference with a SHA-256 checksum.
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
