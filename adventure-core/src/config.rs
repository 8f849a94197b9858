//! Runtime configuration read from the environment.

use crate::generator::GeneratorConfig;
use openai::OpenAi;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_SPEECH_MODEL: &str = "tts-1";
pub const DEFAULT_TEMPERATURE: f32 = 0.8;
pub const DEFAULT_MAX_TOKENS: usize = 1000;

/// Errors in the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("invalid value for {var}: '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Everything the game needs to reach its services.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub speech_model: String,
    pub temperature: f32,
    pub max_tokens: usize,
    /// Audio player command line, overriding autodetection.
    pub player: Option<String>,
}

impl Config {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let api_key = read("OPENAI_API_KEY").ok_or(ConfigError::MissingApiKey)?;

        let temperature = match read("ADVENTURE_TEMPERATURE") {
            Some(value) => value
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|t| (0.0..=2.0).contains(t))
                .ok_or(ConfigError::Invalid {
                    var: "ADVENTURE_TEMPERATURE",
                    value,
                })?,
            None => DEFAULT_TEMPERATURE,
        };

        Ok(Self {
            api_key,
            base_url: read("OPENAI_BASE_URL"),
            model: read("ADVENTURE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            speech_model: read("ADVENTURE_TTS_MODEL")
                .unwrap_or_else(|| DEFAULT_SPEECH_MODEL.to_string()),
            temperature,
            max_tokens: DEFAULT_MAX_TOKENS,
            player: read("ADVENTURE_PLAYER"),
        })
    }

    /// Build an API client for this configuration.
    pub fn client(&self) -> OpenAi {
        let mut client = OpenAi::new(&self.api_key)
            .with_model(&self.model)
            .with_speech_model(&self.speech_model);
        if let Some(ref base_url) = self.base_url {
            client = client.with_base_url(base_url);
        }
        client
    }

    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            model: None,
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
        }
    }
}
