//! HTTP continuation scheduler that re-invokes the processing endpoint.

mod self_invocation;

pub use self_invocation::{DEPTH_HEADER, HttpSelfInvocation};
