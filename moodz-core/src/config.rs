//! Configuration for the MOODZ chat engine.
//!
//! Maps directly to `moodz.toml`. Every field has a default, so an empty
//! file is a valid configuration. Secrets are never stored here: the LLM
//! API key is read from the environment variable named by
//! `llm.api_key_env` and checked by [`MoodzConfig::validate`].

use serde::{Deserialize, Serialize};

use crate::error::{MoodzError, Result};

/// Top-level MOODZ configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoodzConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Mood update policy.
    #[serde(default)]
    pub mood: MoodConfig,
    /// Sentiment adjustment.
    #[serde(default)]
    pub sentiment: SentimentConfig,
    /// LLM integration settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Character extraction settings.
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Conversation memory recall.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Conversation log storage.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl MoodzConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `MoodzError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| MoodzError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check value ranges and that the API key is present in the
    /// environment when the provider needs one.
    ///
    /// # Errors
    /// Returns `MoodzError::Config` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(MoodzError::Config(format!(
                "llm.temperature must be within [0, 2], got {}",
                self.llm.temperature
            )));
        }
        if self.extraction.max_input_chars == 0 {
            return Err(MoodzError::Config(
                "extraction.max_input_chars must be positive".to_string(),
            ));
        }
        if self.memory.recall_trigger.trim().is_empty() {
            return Err(MoodzError::Config(
                "memory.recall_trigger must not be empty".to_string(),
            ));
        }
        match self.llm.provider.as_str() {
            "openai_compatible" => {
                self.llm.api_key()?;
            }
            "ollama" | "none" => {}
            other => {
                return Err(MoodzError::Config(format!(
                    "unknown llm.provider '{other}' (expected openai_compatible, ollama or none)"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// How caller-supplied slider updates are policed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoodConfig {
    /// Reject unknown slider keys instead of ignoring them.
    #[serde(default)]
    pub reject_unknown_keys: bool,
}

/// Sentiment adjustment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentConfig {
    /// Whether the user's text nudges valence/arousal.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// LLM integration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider: "`openai_compatible`", "ollama", "none".
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Base URL for the LLM API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Hard timeout for any LLM call in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Extra attempts after a failed call.
    #[serde(default)]
    pub max_retries: u32,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: 0.7,
            max_tokens: 1024,
            request_timeout_ms: 30_000,
            max_retries: 0,
            api_key_env: default_api_key_env(),
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable.
    ///
    /// # Errors
    /// Returns `MoodzError::Config` if the variable is unset or blank.
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(MoodzError::Config(format!(
                "{} is not set; export it before starting",
                self.api_key_env
            ))),
        }
    }
}

/// Character extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Only the first N characters of a document are sent for analysis.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_input_chars: 10_000,
        }
    }
}

/// Conversation memory recall settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// How many earlier turns with the same character go into the prompt.
    #[serde(default = "default_3_usize")]
    pub recent_turns: usize,
    /// How many cross-character search hits a recall query may cite.
    #[serde(default = "default_3_usize")]
    pub recall_hits: usize,
    /// Phrase in the user's text that triggers a history search.
    #[serde(default = "default_recall_trigger")]
    pub recall_trigger: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            recent_turns: 3,
            recall_hits: 3,
            recall_trigger: default_recall_trigger(),
        }
    }
}

/// Conversation log storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// SQLite database path.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Use WAL mode for concurrent reads.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            wal_mode: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_provider() -> String { "openai_compatible".to_string() }
fn default_base_url() -> String { "https://api.groq.com/openai".to_string() }
fn default_model() -> String { "llama-3.3-70b-versatile".to_string() }
fn default_api_key_env() -> String { "GROQ_API_KEY".to_string() }
fn default_recall_trigger() -> String { "do you know".to_string() }
fn default_db_path() -> String { "chat_history.db".to_string() }
fn default_temperature() -> f32 { 0.7 }
fn default_max_tokens() -> u32 { 1024 }
fn default_timeout_ms() -> u64 { 30_000 }
fn default_max_input_chars() -> usize { 10_000 }
fn default_3_usize() -> usize { 3 }
