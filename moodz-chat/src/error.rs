//! Chat pipeline errors.

use moodz_core::MoodzError;
use moodz_llm::LlmError;
use thiserror::Error;

/// Errors surfaced by uploads and exchanges.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The uploaded document is neither PDF nor plain text.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// The document could not be read (corrupt PDF, non-UTF-8 text).
    #[error("document could not be read: {0}")]
    Document(String),

    /// The model's character list had no usable `Name: Description` line.
    #[error("no characters could be parsed from the extraction reply")]
    ExtractionParse,

    /// The text generator failed.
    #[error("text generation failed: {0}")]
    UpstreamGeneration(#[from] LlmError),

    /// The requested character is not in the session's roster.
    #[error("unknown character: '{0}'")]
    UnknownCharacter(String),

    /// The user sent blank text.
    #[error("prompt must not be empty")]
    EmptyPrompt,

    /// Mood update, configuration or conversation log failure.
    #[error(transparent)]
    Core(#[from] MoodzError),
}

/// Convenience alias for chat results.
pub type Result<T> = std::result::Result<T, ChatError>;
