//! Per-session state.

use moodz_core::{MoodState, SessionId};
use moodz_llm::GenerationSettings;

use crate::roster::CharacterRoster;

/// User id used when the caller does not supply one.
pub const ANONYMOUS: &str = "Anonymous";

/// Everything one chat session owns: its mood, its character roster and
/// the generation settings picked for its exchanges.
///
/// Sessions never share state; two sessions with the same `user_id` still
/// have independent moods. They do share the conversation log.
#[derive(Debug, Clone)]
pub struct ChatSession {
    /// Session identifier for logs.
    pub id: SessionId,
    /// Whose conversation this is.
    pub user_id: String,
    /// Current mood, carried between turns.
    pub mood: MoodState,
    /// Characters from the most recent upload.
    pub roster: CharacterRoster,
    /// Prompting technique and style / length presets for the next
    /// exchanges.
    pub settings: GenerationSettings,
}

impl ChatSession {
    /// A fresh session for `user_id` with a neutral mood and no characters.
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        let user_id = if user_id.trim().is_empty() {
            ANONYMOUS.to_string()
        } else {
            user_id
        };
        Self {
            id: SessionId::new(),
            user_id,
            mood: MoodState::new(),
            roster: CharacterRoster::new(),
            settings: GenerationSettings::default(),
        }
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(ANONYMOUS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_user_is_anonymous() {
        assert_eq!(ChatSession::new("  ").user_id, ANONYMOUS);
        assert_eq!(ChatSession::default().user_id, ANONYMOUS);
    }

    #[test]
    fn sessions_are_independent() {
        let a = ChatSession::new("ada");
        let b = ChatSession::new("ada");
        assert_ne!(a.id, b.id);
        assert_eq!(a.mood, MoodState::new());
        assert!(a.roster.is_empty());
        assert_eq!(a.settings, GenerationSettings::default());
    }
}
