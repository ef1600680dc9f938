//! Domain model for durable generation artifacts.

mod artifact;
mod content;
mod error;
mod name;
mod path;

pub use artifact::{FetchedArtifact, StoredArtifact, sha256_hex};
pub use content::{DEFAULT_CONTENT_TYPE, extension_for, resolve_content_type};
pub use error::{ArtifactError, ArtifactResult};
pub use name::ArtifactName;
pub use path::{ArtifactPath, DEFAULT_PATH_PREFIX};
