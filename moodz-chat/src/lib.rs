//! # moodz-chat: Chat Pipeline for MOODZ
//!
//! Upload a piece of fiction, pick one of its characters, and chat with
//! them while the affect engine in `moodz-core` decides how they feel.
//!
//! - [`document`] turns PDF / plain-text bytes into text.
//! - [`roster`] asks the model who is in the text and parses the answer.
//! - [`session`] holds one user's mood and roster.
//! - [`service`] runs uploads and exchanges against a shared generator
//!   and conversation log.
//! - [`command`] parses the terminal front end's input lines.

#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod command;
pub mod document;
pub mod error;
pub mod roster;
pub mod service;
pub mod session;

pub use error::{ChatError, Result};
pub use roster::{Character, CharacterRoster};
pub use service::{ChatService, ExchangeReply};
pub use session::ChatSession;
