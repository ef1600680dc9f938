//! Adapter implementations for artifact ports.

pub mod http;
pub mod local;
pub mod memory;
