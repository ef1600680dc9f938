//! Chat-completion refinement of rendered templates.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::TemplatePromptComposer;
use crate::prompt::{
    domain::{PromptError, PromptResult},
    ports::PromptComposer,
};
use crate::queue::domain::GenerationTask;

/// Connection settings for [`ChatPromptComposer`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRefinementConfig {
    /// OpenAI-compatible chat completions endpoint.
    pub endpoint: String,
    /// Bearer token.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Sends the rendered template to a chat model and uses its reply as the
/// instruction.
#[derive(Debug, Clone)]
pub struct ChatPromptComposer {
    client: Client,
    config: ChatRefinementConfig,
    template: TemplatePromptComposer,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl ChatPromptComposer {
    /// Creates a composer refining `template` output through the chat
    /// endpoint in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Transport`] when the HTTP client cannot be
    /// built.
    pub fn new(
        config: ChatRefinementConfig,
        template: TemplatePromptComposer,
    ) -> PromptResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(PromptError::transport)?;
        Ok(Self {
            client,
            config,
            template,
        })
    }
}

#[async_trait]
impl PromptComposer for ChatPromptComposer {
    async fn compose(&self, task: &GenerationTask) -> PromptResult<String> {
        let rendered = self.template.render(task)?;
        let request = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage {
                role: "user",
                content: &rendered,
            }],
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(PromptError::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PromptError::Rejected {
                status: status.as_u16(),
                reason: response.text().await.unwrap_or_default(),
            });
        }

        let reply = response
            .json::<ChatResponse>()
            .await
            .map_err(|err| PromptError::MalformedResponse(err.to_string()))?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PromptError::MalformedResponse("reply has no choices".to_owned()))?;

        clean_completion(&content)
    }
}

/// Trims a completion and strips one pair of surrounding double quotes.
fn clean_completion(content: &str) -> PromptResult<String> {
    let trimmed = content.trim();
    let without_open = trimmed.strip_prefix('"').unwrap_or(trimmed);
    let unquoted = without_open
        .strip_suffix('"')
        .unwrap_or(without_open)
        .trim();
    if unquoted.is_empty() {
        return Err(PromptError::EmptyInstruction);
    }
    Ok(unquoted.to_owned())
}

#[cfg(test)]
mod tests {
    //! Completion cleanup tests.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain("  a tight pack of runners  ", "a tight pack of runners")]
    #[case::quoted("\"a tight pack of runners\"", "a tight pack of runners")]
    #[case::leading_quote_only("\"a pack", "a pack")]
    #[case::inner_quotes_kept("a \"pack\" of runners", "a \"pack\" of runners")]
    fn clean_completion_trims_and_unquotes(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(clean_completion(raw).expect("non-empty completion"), expected);
    }

    #[rstest]
    #[case::blank("   ")]
    #[case::only_quotes("\"\"")]
    fn clean_completion_rejects_empty_replies(#[case] raw: &str) {
        assert!(matches!(
            clean_completion(raw),
            Err(PromptError::EmptyInstruction)
        ));
    }
}
