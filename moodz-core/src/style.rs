//! Style Selector: emotion intensities → narrative register.
//!
//! Priority is fixed: anger beats sadness beats joy. A turn with both
//! anger ≥ 4 and sadness ≥ 4 is always [`Register::Irritated`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::EmotionIntensities;

/// Intensity at which an emotion takes over the register.
pub const REGISTER_THRESHOLD: u8 = 4;

/// The tone instruction handed to the generation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Register {
    /// Short, direct, sometimes sarcastic. Discloses anger.
    Irritated,
    /// Slow, reflective, deep. Discloses sadness.
    Melancholic,
    /// Enthusiastic and upbeat. Discloses joy.
    Joyful,
    /// No tone or disclosure instruction.
    Neutral,
}

impl Register {
    /// Tone instruction appended to the character's system prompt, or
    /// `None` for [`Register::Neutral`].
    #[must_use]
    pub fn instruction(self) -> Option<&'static str> {
        match self {
            Self::Irritated => Some(
                "You are irritated and impatient. Respond with short, direct, and sometimes \
                 sarcastic remarks. Let the user know you're angry in your response.",
            ),
            Self::Melancholic => Some(
                "You are melancholic and sorrowful. Speak slowly and thoughtfully, with a deep, \
                 reflective tone. Let the user know you're feeling down in your response.",
            ),
            Self::Joyful => Some(
                "You are cheerful and excited. Respond with enthusiasm, positivity, and an \
                 upbeat tone. Let the user know you're joyful in your response.",
            ),
            Self::Neutral => None,
        }
    }

    /// Whether the reply must tell the user how the character feels.
    #[must_use]
    pub fn discloses_mood(self) -> bool {
        !matches!(self, Self::Neutral)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Irritated => "irritated",
            Self::Melancholic => "melancholic",
            Self::Joyful => "joyful",
            Self::Neutral => "neutral",
        };
        f.write_str(name)
    }
}

/// Pick the register for a turn.
#[must_use]
pub fn select_style(intensities: EmotionIntensities) -> Register {
    if intensities.anger() >= REGISTER_THRESHOLD {
        Register::Irritated
    } else if intensities.sadness() >= REGISTER_THRESHOLD {
        Register::Melancholic
    } else if intensities.joy() >= REGISTER_THRESHOLD {
        Register::Joyful
    } else {
        Register::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn i(anger: u8, sadness: u8, joy: u8) -> EmotionIntensities {
        EmotionIntensities::new(anger, sadness, joy)
    }

    #[test]
    fn anger_dominates_sadness() {
        assert_eq!(select_style(i(5, 5, 1)), Register::Irritated);
        assert_eq!(select_style(i(4, 5, 5)), Register::Irritated);
    }

    #[test]
    fn sadness_beats_joy() {
        assert_eq!(select_style(i(3, 4, 5)), Register::Melancholic);
    }

    #[test]
    fn joy_when_nothing_else_fires() {
        assert_eq!(select_style(i(3, 3, 4)), Register::Joyful);
    }

    #[test]
    fn neutral_below_threshold() {
        assert_eq!(select_style(i(3, 3, 3)), Register::Neutral);
        assert!(Register::Neutral.instruction().is_none());
        assert!(!Register::Neutral.discloses_mood());
    }

    #[test]
    fn every_mooded_register_discloses() {
        assert!(Register::Irritated.instruction().is_some_and(|s| s.contains("angry")));
        assert!(Register::Melancholic.instruction().is_some_and(|s| s.contains("feeling down")));
        assert!(Register::Joyful.instruction().is_some_and(|s| s.contains("joyful")));
    }
}
