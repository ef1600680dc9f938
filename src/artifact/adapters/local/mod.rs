//! Local filesystem artifact storage.

mod storage;

pub use storage::LocalArtifactStorage;
