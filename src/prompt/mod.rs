//! Instruction composition for generation tasks.
//!
//! Turns a task's opaque payload into the single instruction string
//! submitted to the generation service.

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
