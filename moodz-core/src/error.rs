//! Error types for the MOODZ core library.

use thiserror::Error;

/// Top-level error type for all MOODZ core operations.
#[derive(Error, Debug)]
pub enum MoodzError {
    /// A mood update carried an out-of-range value or an unknown key.
    #[error("Invalid mood parameter '{name}': {reason}")]
    InvalidParameter {
        /// The offending key as supplied by the caller.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, MoodzError>;
