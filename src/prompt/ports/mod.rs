//! Port contracts for instruction composition.

mod composer;

pub use composer::PromptComposer;
