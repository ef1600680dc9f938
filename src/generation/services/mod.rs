//! Orchestration services for generation jobs.

mod client;

pub use client::GenerationClient;
