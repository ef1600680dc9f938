//! Adapter implementations for queue ports.

pub mod http;
pub mod memory;
pub mod postgres;
