//! Adapter implementations for the generation service port.

mod nanobanana;
mod scripted;

pub use nanobanana::{NanobananaApi, NanobananaConfig};
pub use scripted::ScriptedGenerationApi;
