//! Model configuration for assistant LLM bindings.

use serde::{Deserialize, Serialize};

/// LLM provider configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// OpenRouter API (supports multiple models).
    #[default]
    OpenRouter,
    /// Anthropic API (Claude models).
    Anthropic,
    /// OpenAI API (GPT models).
    OpenAI,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenRouter => write!(f, "openrouter"),
            Self::Anthropic => write!(f, "anthropic"),
            Self::OpenAI => write!(f, "openai"),
        }
    }
}

/// Model binding for one assistant.
///
/// The assistant's instruction text lives on the assistant definition, not
/// here; this struct only describes how to reach the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier (e.g., "google/gemini-2.5-flash").
    pub model: String,

    /// Maximum tokens to generate in responses.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature for response generation (0.0 to 2.0).
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// LLM provider to use.
    #[serde(default)]
    pub provider: Provider,

    /// Optional API key override (if not using the environment variable).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub api_key: Option<String>,
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "google/gemini-2.5-flash".into(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            provider: Provider::default(),
            api_key: None,
        }
    }
}

impl ModelConfig {
    /// Create a new model configuration with the given model ID.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Configuration for Gemini Flash via OpenRouter, the roster default.
    pub fn gemini_flash() -> Self {
        Self::new("google/gemini-2.5-flash")
    }

    /// Configuration for Claude Sonnet via OpenRouter.
    pub fn claude_sonnet() -> Self {
        Self {
            model: "anthropic/claude-sonnet-4".into(),
            max_tokens: 8192,
            ..Default::default()
        }
    }

    /// Set the maximum tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    /// Set the provider.
    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    /// Set an explicit API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}
