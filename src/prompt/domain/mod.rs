//! Domain model for instruction composition.

mod archetype;
mod context;
mod error;
mod template;

pub use archetype::{DEFAULT_ARCHETYPES, select_archetype};
pub use context::{ContextField, DEFAULT_CONTEXT_FIELDS, EMPTY_CONTEXT, detailed_context};
pub use error::{PromptError, PromptResult};
pub use template::{DEFAULT_TEMPLATE, PromptVariables};
