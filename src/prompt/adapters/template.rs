//! Template-rendering instruction composer.

use async_trait::async_trait;
use minijinja::Environment;

use crate::prompt::{
    domain::{
        ContextField, DEFAULT_ARCHETYPES, DEFAULT_CONTEXT_FIELDS, DEFAULT_TEMPLATE, PromptError,
        PromptResult, PromptVariables, detailed_context, select_archetype,
    },
    ports::PromptComposer,
};
use crate::queue::domain::GenerationTask;

/// Renders a `minijinja` template from the task payload.
#[derive(Debug, Clone)]
pub struct TemplatePromptComposer {
    template: String,
    archetypes: Vec<String>,
    fields: Vec<ContextField>,
}

impl Default for TemplatePromptComposer {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl TemplatePromptComposer {
    /// Creates a composer for `template` with the default archetypes and
    /// context fields.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            archetypes: DEFAULT_ARCHETYPES.iter().map(|line| (*line).to_owned()).collect(),
            fields: DEFAULT_CONTEXT_FIELDS.to_vec(),
        }
    }

    /// Replaces the archetypes; an empty list falls back to the defaults.
    #[must_use]
    pub fn with_archetypes(mut self, archetypes: Vec<String>) -> Self {
        if !archetypes.is_empty() {
            self.archetypes = archetypes;
        }
        self
    }

    /// Builds the template variables for `task`.
    #[must_use]
    pub fn variables(&self, task: &GenerationTask) -> PromptVariables {
        let payload = task.payload();
        PromptVariables {
            event_name: payload.name().to_owned(),
            event_type: payload.category().to_owned(),
            detailed_context: detailed_context(payload, &self.fields),
            archetype: select_archetype(&self.archetypes, task.id())
                .unwrap_or_default()
                .to_owned(),
        }
    }

    /// Renders the template for `task`.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Template`] when rendering fails and
    /// [`PromptError::EmptyInstruction`] when the result is blank.
    pub fn render(&self, task: &GenerationTask) -> PromptResult<String> {
        let environment = Environment::new();
        let rendered = environment
            .render_str(&self.template, self.variables(task))
            .map_err(|error| PromptError::Template(error.to_string()))?;
        let trimmed = rendered.trim();
        if trimmed.is_empty() {
            return Err(PromptError::EmptyInstruction);
        }
        Ok(trimmed.to_owned())
    }
}

#[async_trait]
impl PromptComposer for TemplatePromptComposer {
    async fn compose(&self, task: &GenerationTask) -> PromptResult<String> {
        self.render(task)
    }
}
