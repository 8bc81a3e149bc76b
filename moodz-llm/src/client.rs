//! LLM Client: unified interface for OpenAI-compatible and Ollama backends.

use std::time::{Duration, Instant};

use moodz_core::config::LlmConfig;
use reqwest::{Client, RequestBuilder};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::error::LlmError;
use crate::types::{LlmRequest, LlmResponse};

/// Provider backend for LLM inference.
#[derive(Clone)]
pub enum LlmProvider {
    /// OpenAI-compatible chat completions API (Groq, OpenAI, Together, ...).
    OpenAiCompatible {
        /// Host root; `/v1/chat/completions` is appended.
        base_url: String,
        /// Bearer token.
        api_key: String,
    },
    /// Ollama running locally.
    Ollama {
        /// Host root; `/api/generate` is appended.
        base_url: String,
    },
    /// No LLM available; every call returns [`LlmError::Unavailable`].
    None,
}

impl std::fmt::Debug for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAiCompatible { base_url, .. } => f
                .debug_struct("OpenAiCompatible")
                .field("base_url", base_url)
                .field("api_key", &"<redacted>")
                .finish(),
            Self::Ollama { base_url } => {
                f.debug_struct("Ollama").field("base_url", base_url).finish()
            }
            Self::None => f.write_str("None"),
        }
    }
}

impl LlmProvider {
    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAiCompatible { .. } => "openai_compatible",
            Self::Ollama { .. } => "ollama",
            Self::None => "none",
        }
    }
}

/// The LLM client: one provider, one model, fixed generation defaults.
#[derive(Debug)]
pub struct LlmClient {
    provider: LlmProvider,
    http: Client,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout_ms: u64,
    max_retries: u32,
}

impl LlmClient {
    /// Create a new LLM client with stock generation settings.
    #[must_use]
    pub fn new(provider: LlmProvider, model: impl Into<String>, max_retries: u32) -> Self {
        let defaults = LlmRequest::new("", "");
        Self {
            provider,
            http: Client::new(),
            model: model.into(),
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            timeout_ms: defaults.timeout_ms,
            max_retries,
        }
    }

    /// Create a client with no LLM backend.
    #[must_use]
    pub fn none() -> Self {
        Self::new(LlmProvider::None, "", 0)
    }

    /// Build a client from the `[llm]` config section.
    ///
    /// The API key for `openai_compatible` is read from the environment
    /// variable named by `api_key_env`.
    ///
    /// # Errors
    /// Returns [`LlmError::ConfigError`] for an unknown provider or a
    /// missing API key.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let provider = match config.provider.as_str() {
            "openai_compatible" => LlmProvider::OpenAiCompatible {
                base_url,
                api_key: config.api_key()?,
            },
            "ollama" => LlmProvider::Ollama { base_url },
            "none" => LlmProvider::None,
            other => {
                return Err(LlmError::ConfigError(format!("unknown provider '{other}'")));
            }
        };

        info!(
            provider = provider.name(),
            model = %config.model,
            "LLM client configured"
        );

        Ok(Self {
            provider,
            http: Client::new(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_ms: config.request_timeout_ms,
            max_retries: config.max_retries,
        })
    }

    /// A request carrying this client's configured generation settings.
    #[must_use]
    pub fn request(&self, system: impl Into<String>, user: impl Into<String>) -> LlmRequest {
        LlmRequest::new(system, user)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .with_timeout(self.timeout_ms)
    }

    /// Generate a response from the LLM.
    ///
    /// # Errors
    /// Returns `Err` if the LLM is unavailable or all attempts fail.
    pub async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        match &self.provider {
            LlmProvider::None => Err(LlmError::Unavailable("No LLM provider configured".into())),
            LlmProvider::Ollama { base_url } => {
                let url = format!("{base_url}/api/generate");
                let body = json!({
                    "model": self.model,
                    "system": request.system,
                    "prompt": request.user,
                    "stream": false,
                    "options": {
                        "temperature": request.temperature,
                        "num_predict": request.max_tokens,
                    }
                });
                let (json, latency_ms) = self
                    .send_with_retries(request, || self.http.post(&url).json(&body))
                    .await?;
                self.response_from(&json, &json["response"], &json["eval_count"], latency_ms)
            }
            LlmProvider::OpenAiCompatible { base_url, api_key } => {
                let url = format!("{base_url}/v1/chat/completions");
                let body = json!({
                    "model": self.model,
                    "messages": [
                        { "role": "system", "content": request.system },
                        { "role": "user", "content": request.user },
                    ],
                    "max_tokens": request.max_tokens,
                    "temperature": request.temperature,
                });
                let (json, latency_ms) = self
                    .send_with_retries(request, || {
                        self.http.post(&url).bearer_auth(api_key).json(&body)
                    })
                    .await?;
                self.response_from(
                    &json,
                    &json["choices"][0]["message"]["content"],
                    &json["usage"]["completion_tokens"],
                    latency_ms,
                )
            }
        }
    }

    /// Send the request built by `build`, retrying up to `max_retries`
    /// extra times on transport errors and non-2xx statuses. Returns the
    /// JSON body and the latency of the successful call.
    async fn send_with_retries<F>(
        &self,
        request: &LlmRequest,
        build: F,
    ) -> Result<(Value, u64), LlmError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut last_error = String::new();
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!(
                    attempt = attempt + 1,
                    of = self.max_retries + 1,
                    provider = self.provider.name(),
                    "Retrying LLM call"
                );
            }

            let start = Instant::now();
            let result = build()
                .timeout(Duration::from_millis(request.timeout_ms))
                .send()
                .await;

            match result {
                Ok(resp) if resp.status().is_success() => {
                    let json: Value = resp
                        .json()
                        .await
                        .map_err(|e| LlmError::ParseError(e.to_string()))?;
                    let latency_ms =
                        u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                    debug!(
                        provider = self.provider.name(),
                        latency_ms,
                        "LLM call succeeded"
                    );
                    return Ok((json, latency_ms));
                }
                Ok(resp) => {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    last_error = format!("HTTP {status}: {body}");
                    warn!(
                        provider = self.provider.name(),
                        error = %last_error,
                        "LLM returned error"
                    );
                }
                Err(e) if e.is_timeout() => {
                    last_error = format!("timed out after {}ms", request.timeout_ms);
                    warn!(provider = self.provider.name(), "LLM request timed out");
                    if self.max_retries == 0 {
                        return Err(LlmError::Timeout(request.timeout_ms));
                    }
                }
                Err(e) => {
                    last_error = e.to_string();
                    warn!(
                        provider = self.provider.name(),
                        error = %last_error,
                        "LLM request failed"
                    );
                    if self.max_retries == 0 {
                        return Err(e.into());
                    }
                }
            }
        }

        Err(LlmError::RetriesExhausted {
            attempts: self.max_retries + 1,
            last_error,
        })
    }

    fn response_from(
        &self,
        raw: &Value,
        text: &Value,
        tokens: &Value,
        latency_ms: u64,
    ) -> Result<LlmResponse, LlmError> {
        let text = text.as_str().ok_or_else(|| {
            LlmError::ParseError(format!("no generated text in response: {raw}"))
        })?;
        Ok(LlmResponse {
            text: text.to_string(),
            tokens_generated: tokens
                .as_u64()
                .and_then(|t| u32::try_from(t).ok())
                .unwrap_or(0),
            latency_ms,
            model: self.model.clone(),
        })
    }

    /// Check if the LLM client has a backend configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self.provider, LlmProvider::None)
    }

    /// The configured provider.
    #[must_use]
    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GenerationOptions;

    #[tokio::test]
    async fn none_provider_is_unavailable() {
        let client = LlmClient::none();
        assert!(!client.is_available());
        let err = client
            .complete(&LlmRequest::new("sys", "hi"))
            .await
            .expect_err("no backend");
        assert!(matches!(err, LlmError::Unavailable(_)));
    }

    #[test]
    fn from_config_picks_provider() {
        let mut config = LlmConfig {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434/".to_string(),
            ..LlmConfig::default()
        };
        let client = LlmClient::from_config(&config).expect("ollama needs no key");
        match client.provider() {
            LlmProvider::Ollama { base_url } => assert_eq!(base_url, "http://localhost:11434"),
            other => panic!("unexpected provider {other:?}"),
        }

        config.provider = "telegraph".to_string();
        assert!(matches!(
            LlmClient::from_config(&config),
            Err(LlmError::ConfigError(_))
        ));
    }

    #[test]
    fn missing_key_is_config_error() {
        let config = LlmConfig {
            api_key_env: "MOODZ_LLM_TEST_KEY_NEVER_SET".to_string(),
            ..LlmConfig::default()
        };
        let err = LlmClient::from_config(&config).expect_err("no key");
        assert!(err.to_string().contains("MOODZ_LLM_TEST_KEY_NEVER_SET"));
    }

    #[test]
    fn request_carries_configured_settings() {
        let config = LlmConfig {
            provider: "none".to_string(),
            temperature: 0.2,
            max_tokens: 64,
            request_timeout_ms: 1500,
            ..LlmConfig::default()
        };
        let client = LlmClient::from_config(&config).expect("none");
        let req = client.request("s", "u");
        assert!((req.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(req.max_tokens, 64);
        assert_eq!(req.timeout_ms, 1500);
    }

    #[test]
    fn options_override_only_what_they_set() {
        let config = LlmConfig {
            provider: "none".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            ..LlmConfig::default()
        };
        let client = LlmClient::from_config(&config).expect("none");

        let req = client.request("s", "u").with_options(GenerationOptions {
            temperature: None,
            max_tokens: Some(50),
        });
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(req.max_tokens, 50);
    }

    #[test]
    fn debug_redacts_api_key() {
        let provider = LlmProvider::OpenAiCompatible {
            base_url: "https://example.invalid".to_string(),
            api_key: "sk-secret".to_string(),
        };
        assert!(!format!("{provider:?}").contains("sk-secret"));
    }
}
