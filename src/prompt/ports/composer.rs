//! Composer port consumed by the task processor.

use crate::prompt::domain::PromptResult;
use crate::queue::domain::GenerationTask;
use async_trait::async_trait;

/// Builds the instruction for one attempt of a task.
#[async_trait]
pub trait PromptComposer: Send + Sync {
    /// Composes the instruction for `task`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::prompt::domain::PromptError`] when no instruction can
    /// be produced.
    async fn compose(&self, task: &GenerationTask) -> PromptResult<String>;
}
