//! Request and response types for single-turn generation.

use serde::{Deserialize, Serialize};

/// A single-turn request: one system message, one user message.
#[derive(Debug, Clone, Serialize)]
pub struct LlmRequest {
    /// System prompt (character persona, tone, memory context).
    pub system: String,
    /// User prompt (the user's words, or the document to analyse).
    pub user: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl LlmRequest {
    /// A request with the stock chat settings (temperature 0.7, 1024
    /// tokens, 30 s timeout).
    #[must_use]
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens: 1024,
            temperature: 0.7,
            timeout_ms: 30_000,
        }
    }

    /// Set the token limit.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Apply whichever per-call overrides `options` carries.
    #[must_use]
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        if let Some(temperature) = options.temperature {
            self.temperature = temperature;
        }
        if let Some(max_tokens) = options.max_tokens {
            self.max_tokens = max_tokens;
        }
        self
    }
}

/// Per-call overrides for temperature and token limit. `None` keeps the
/// generator's own setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GenerationOptions {
    /// Sampling temperature override.
    pub temperature: Option<f32>,
    /// Token limit override.
    pub max_tokens: Option<u32>,
}

/// A response from the LLM.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmResponse {
    /// The generated text.
    pub text: String,
    /// How many tokens were generated (0 if the provider does not say).
    pub tokens_generated: u32,
    /// Latency in milliseconds.
    pub latency_ms: u64,
    /// Which model was used.
    pub model: String,
}
