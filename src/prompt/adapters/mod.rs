//! Adapter implementations for the composer port.

mod chat;
mod template;

pub use chat::{ChatPromptComposer, ChatRefinementConfig};
pub use template::TemplatePromptComposer;
