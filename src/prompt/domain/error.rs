//! Error types for instruction composition.

use std::sync::Arc;
use thiserror::Error;

/// Result type for instruction composition.
pub type PromptResult<T> = Result<T, PromptError>;

/// Errors returned while composing an instruction.
#[derive(Debug, Clone, Error)]
pub enum PromptError {
    /// The template failed to render.
    #[error("prompt template failed to render: {0}")]
    Template(String),

    /// Composition produced an empty instruction.
    #[error("composed instruction is empty")]
    EmptyInstruction,

    /// The refinement service refused the request.
    #[error("prompt refinement rejected with HTTP {status}: {reason}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Reason reported by the service.
        reason: String,
    },

    /// The refinement service replied without a usable completion.
    #[error("malformed prompt refinement response: {0}")]
    MalformedResponse(String),

    /// Transport-level failure while talking to the refinement service.
    #[error("prompt refinement transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl PromptError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }

    /// Returns a stable label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Template(_) => "template",
            Self::EmptyInstruction => "empty_instruction",
            Self::Rejected { .. } => "refinement_rejected",
            Self::MalformedResponse(_) => "refinement_malformed",
            Self::Transport(_) => "refinement_transport",
        }
    }
}
