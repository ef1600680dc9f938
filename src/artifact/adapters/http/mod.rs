//! HTTP artifact adapters.

mod bucket;
mod source;

pub use bucket::{HttpBucketConfig, HttpBucketStorage};
pub use source::HttpArtifactSource;
