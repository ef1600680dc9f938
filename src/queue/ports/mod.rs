//! Port contracts for the generation task queue.
//!
//! Ports define infrastructure-agnostic interfaces used by queue services.

pub mod continuation;
pub mod store;

pub use continuation::{ContinuationError, ContinuationResult, ContinuationScheduler};
pub use store::{ClaimOutcome, TaskStore, TaskStoreError, TaskStoreResult, ensure_disposition};
