//! # moodz-llm: LLM Layer for MOODZ
//!
//! Everything that talks to a language model goes through this crate:
//!   - **OpenAI-compatible API** (Groq by default, or any `/v1/chat/completions` host)
//!   - **Ollama** (local)
//!   - **None** (every call fails; useful offline and in tests)
//!
//! Two prompts exist: the literary-analyst prompt that lists a document's
//! characters, and the per-turn character system prompt. Both live in
//! [`prompt`]; [`technique`] holds the per-exchange prompting technique
//! and the style / length presets. Callers depend on the [`TextGenerator`] trait rather than
//! on [`LlmClient`], so tests can script replies.

#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod error;
pub mod generator;
pub mod prompt;
pub mod technique;
pub mod types;

pub use client::{LlmClient, LlmProvider};
pub use error::LlmError;
pub use generator::TextGenerator;
pub use technique::{GenerationSettings, PromptTechnique, ResponseLength, ResponseStyle};
pub use types::{GenerationOptions, LlmRequest, LlmResponse};
