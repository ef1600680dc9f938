//! Port contracts for the artifact context.

mod source;
mod storage;

pub use source::ArtifactSource;
pub use storage::ArtifactStorage;
