//! Step definitions for queue drain scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
