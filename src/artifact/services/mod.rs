//! Orchestration services for artifacts.

mod materializer;

pub use materializer::{MaterializerSettings, ResultMaterializer};
