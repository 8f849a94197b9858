//! Turn generation.
//!
//! The `Generator` trait is the seam between the session and a language
//! model. `LlmGenerator` sends the prompt to the OpenAI chat endpoint in JSON
//! mode and parses the reply into a [`Turn`].

use crate::prompts::Prompt;
use crate::turn::{parse_reply, Turn};
use async_trait::async_trait;
use openai::{ChatRequest, FinishReason, Message, OpenAi};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from turn generation.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("API error: {0}")]
    Api(#[from] openai::Error),

    #[error("malformed reply from the model: {0}")]
    Malformed(String),
}

/// Produces the next turn for a prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &Prompt) -> Result<Turn, GenerationError>;
}

/// Settings for [`LlmGenerator`].
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Overrides the client's default model.
    pub model: Option<String>,
    pub max_tokens: usize,
    pub temperature: Option<f32>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 1000,
            temperature: Some(0.8),
        }
    }
}

/// Generation through the OpenAI chat completions endpoint.
pub struct LlmGenerator {
    client: OpenAi,
    config: GeneratorConfig,
}

impl LlmGenerator {
    pub fn new(client: OpenAi) -> Self {
        Self {
            client,
            config: GeneratorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    fn build_request(&self, prompt: &Prompt) -> ChatRequest {
        let mut request = ChatRequest::new(vec![
            Message::system(&prompt.system),
            Message::user(&prompt.user),
        ])
        .with_max_tokens(self.config.max_tokens)
        .json();

        if let Some(ref model) = self.config.model {
            request = request.with_model(model);
        }

        if let Some(temp) = self.config.temperature {
            request = request.with_temperature(temp);
        }

        request
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<Turn, GenerationError> {
        let response = self.client.complete(self.build_request(prompt)).await?;

        if let Some(usage) = &response.usage {
            debug!(
                model = %response.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "turn generated"
            );
        }

        if response.finish_reason() == Some(FinishReason::Length) {
            warn!("reply hit the token limit and may be truncated");
        }

        parse_reply(response.text()).map_err(|reason| {
            warn!(%reason, "discarding malformed reply");
            GenerationError::Malformed(reason)
        })
    }
}
