//! # MOODZ Core Library
//!
//! Deterministic affect engine for role-played fictional characters.
//!
//! Every chat session owns a [`MoodState`]: six bounded "sliders" on a 1–7
//! scale. Each turn the engine
//!
//! 1. applies the caller's partial slider update ([`mood`]),
//! 2. optionally nudges valence/arousal from the user's text ([`sentiment`]),
//! 3. derives three emotion intensities on a 1–5 scale ([`emotion`]),
//! 4. picks a narrative register from them ([`style`]).
//!
//! [`turn`] strings the four steps together, [`recall`] turns past
//! conversation into prompt context, and [`history`] persists the
//! conversation turns annotated with those intensities.
//!
//! ## Determinism Contract
//!
//! - The calculator is pure integer arithmetic with truncating division.
//! - Every parameter stays in `[1, 7]` and every intensity in `[1, 5]`.
//! - Register priority is fixed: anger, then sadness, then joy.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod emotion;
pub mod error;
pub mod history;
pub mod mood;
pub mod recall;
pub mod sentiment;
pub mod style;
pub mod turn;
pub mod types;

pub use config::MoodzConfig;
pub use error::MoodzError;
pub use history::ConversationLog;
pub use mood::{MoodState, MoodUpdate};
pub use style::{Register, select_style};
pub use turn::AffectEngine;
pub use types::*;
