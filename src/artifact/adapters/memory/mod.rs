//! In-memory artifact adapters for tests and local runs.

mod source;
mod storage;

pub use source::StaticArtifactSource;
pub use storage::{InMemoryArtifactStorage, StoredObject};
