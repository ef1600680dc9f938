//! In-memory adapters for queue tests and single-process runs.

mod continuation;
mod store;

pub use continuation::{ChannelContinuation, ContinuationReceiver, RecordingContinuation};
pub use store::InMemoryTaskStore;
