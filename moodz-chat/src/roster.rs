//! Character roster and extraction.
//!
//! The model is asked for `Name: Description` lines; [`parse_roster`] is
//! deliberately forgiving about everything else it sends back.

use serde::Serialize;
use tracing::{debug, info, warn};

use moodz_llm::{TextGenerator, prompt};

use crate::error::{ChatError, Result};

/// One extracted character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Character {
    /// Display name as the model wrote it.
    pub name: String,
    /// Speaking-style description fed into the persona prompt.
    pub style: String,
}

/// Characters available in a session, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CharacterRoster {
    characters: Vec<Character>,
}

impl CharacterRoster {
    /// An empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a character. A repeated name keeps its position but takes the
    /// new style.
    pub fn insert(&mut self, name: impl Into<String>, style: impl Into<String>) {
        let name = name.into();
        let style = style.into();
        match self.characters.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.style = style,
            None => self.characters.push(Character { name, style }),
        }
    }

    /// Style description for `name` (exact match).
    #[must_use]
    pub fn style_of(&self, name: &str) -> Option<&str> {
        self.characters
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.style.as_str())
    }

    /// Whether `name` is in the roster.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.style_of(name).is_some()
    }

    /// Names in first-seen order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.characters.iter().map(|c| c.name.as_str())
    }

    /// All characters in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.characters.iter()
    }

    /// Number of characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    /// Whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}

fn is_name_noise(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '*' | ' ')
}

/// Parse the model's `Name: Description` reply.
///
/// Each line containing a colon is split at the first one. Numbering,
/// dots, asterisks and spaces are trimmed from both ends of the name; the
/// description is whitespace-trimmed. Lines with an empty name or empty
/// description are dropped.
///
/// # Errors
/// [`ChatError::ExtractionParse`] when no line survives.
pub fn parse_roster(reply: &str) -> Result<CharacterRoster> {
    let mut roster = CharacterRoster::new();
    for line in reply.lines() {
        let Some((name, style)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim_matches(is_name_noise);
        let style = style.trim();
        if name.is_empty() || style.is_empty() {
            debug!(line, "Dropping malformed roster line");
            continue;
        }
        roster.insert(name, style);
    }

    if roster.is_empty() {
        Err(ChatError::ExtractionParse)
    } else {
        Ok(roster)
    }
}

/// Ask `generator` for the characters in `text`.
///
/// Only the first `max_chars` characters are sent. A reply with no usable
/// lines yields an empty roster (logged), not an error.
///
/// # Errors
/// [`ChatError::UpstreamGeneration`] if the generator fails.
pub async fn extract_characters<G: TextGenerator>(
    generator: &G,
    text: &str,
    max_chars: usize,
) -> Result<CharacterRoster> {
    let (system, user) = prompt::extraction_prompts(text, max_chars);
    let reply = generator.generate(&system, &user).await.map_err(|e| {
        warn!(error = %e, "Character extraction failed");
        ChatError::UpstreamGeneration(e)
    })?;

    match parse_roster(&reply) {
        Ok(roster) => {
            info!(
                characters = roster.len(),
                names = ?roster.names().collect::<Vec<_>>(),
                "Characters extracted"
            );
            Ok(roster)
        }
        Err(ChatError::ExtractionParse) => {
            warn!(reply_chars = reply.chars().count(), "No characters found in extraction reply");
            Ok(CharacterRoster::new())
        }
        Err(other) => Err(other),
    }
}
