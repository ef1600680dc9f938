//! Domain model for external asynchronous generation jobs.
//!
//! Job handles, status classification, output-reference extraction and the
//! bounded polling policy live here, independent of the HTTP contract of any
//! particular generation service.

mod error;
mod extraction;
mod job;
mod poll;
mod status;

pub use error::{GenerationError, GenerationResult};
pub use extraction::extract_output_reference;
pub use job::{GenerationRequest, JobHandle, OutputReference};
pub use poll::{DEFAULT_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL, PollPolicy};
pub use status::{JobProgress, StatusReport};
