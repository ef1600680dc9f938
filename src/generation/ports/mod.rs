//! Port contracts for the generation context.

mod api;

pub use api::GenerationApi;
