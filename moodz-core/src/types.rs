//! Core type definitions for the MOODZ affect engine.
//!
//! All types are serializable so they can cross the store and the wire
//! unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::MoodzError;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Unique identifier for one chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Mood Parameters
// ---------------------------------------------------------------------------

/// Lowest value any mood parameter may take.
pub const MOOD_MIN: u8 = 1;
/// Highest value any mood parameter may take.
pub const MOOD_MAX: u8 = 7;
/// Neutral midpoint every parameter starts at.
pub const MOOD_DEFAULT: u8 = 4;

/// Lowest emotion intensity.
pub const INTENSITY_MIN: u8 = 1;
/// Highest emotion intensity.
pub const INTENSITY_MAX: u8 = 5;

/// One of the six mood sliders.
///
/// The string form (`Display` / `FromStr`) is the snake_case key used in
/// partial updates coming from callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodParameter {
    /// Unpleasant (1) → pleasant (7).
    Valence,
    /// Calm (1) → agitated (7).
    Arousal,
    /// How picky the character is about what it reacts to.
    SelectionThreshold,
    /// Level of detail the character resolves. Collected but unused by
    /// the calculator.
    ResolutionLevel,
    /// How focused the character is on its goals.
    GoalDirectedness,
    /// How quickly the character secures its surroundings.
    SecuringRate,
}

impl MoodParameter {
    /// All parameters, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Valence,
        Self::Arousal,
        Self::SelectionThreshold,
        Self::ResolutionLevel,
        Self::GoalDirectedness,
        Self::SecuringRate,
    ];

    /// The snake_case key for this parameter.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Valence => "valence",
            Self::Arousal => "arousal",
            Self::SelectionThreshold => "selection_threshold",
            Self::ResolutionLevel => "resolution_level",
            Self::GoalDirectedness => "goal_directedness",
            Self::SecuringRate => "securing_rate",
        }
    }

    /// Human-readable label, as shown on a slider.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Valence => "Valence",
            Self::Arousal => "Arousal",
            Self::SelectionThreshold => "Selection Threshold",
            Self::ResolutionLevel => "Resolution Level",
            Self::GoalDirectedness => "Goal-Directedness",
            Self::SecuringRate => "Securing Rate",
        }
    }
}

impl fmt::Display for MoodParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for MoodParameter {
    type Err = MoodzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.key() == s)
            .ok_or_else(|| MoodzError::InvalidParameter {
                name: s.to_string(),
                reason: "unknown mood parameter".to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Emotion Intensities
// ---------------------------------------------------------------------------

/// The three derived emotion intensities for one turn, each in `[1, 5]`.
///
/// Fields are private so every value, including deserialized ones, has
/// passed the `[1, 5]` check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawIntensities")]
pub struct EmotionIntensities {
    anger: u8,
    sadness: u8,
    joy: u8,
}

#[derive(Deserialize)]
struct RawIntensities {
    anger: u8,
    sadness: u8,
    joy: u8,
}

impl TryFrom<RawIntensities> for EmotionIntensities {
    type Error = MoodzError;

    fn try_from(raw: RawIntensities) -> Result<Self, Self::Error> {
        let values = [
            ("anger", raw.anger),
            ("sadness", raw.sadness),
            ("joy", raw.joy),
        ];
        for (name, value) in values {
            if !(INTENSITY_MIN..=INTENSITY_MAX).contains(&value) {
                return Err(MoodzError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("intensity {value} outside [{INTENSITY_MIN}, {INTENSITY_MAX}]"),
                });
            }
        }
        Ok(Self {
            anger: raw.anger,
            sadness: raw.sadness,
            joy: raw.joy,
        })
    }
}

impl EmotionIntensities {
    /// Build intensities, saturating each value into `[1, 5]`.
    #[must_use]
    pub fn new(anger: u8, sadness: u8, joy: u8) -> Self {
        let sat = |v: u8| v.clamp(INTENSITY_MIN, INTENSITY_MAX);
        Self {
            anger: sat(anger),
            sadness: sat(sadness),
            joy: sat(joy),
        }
    }

    /// Irritation.
    #[must_use]
    pub fn anger(self) -> u8 {
        self.anger
    }

    /// Melancholy.
    #[must_use]
    pub fn sadness(self) -> u8 {
        self.sadness
    }

    /// Cheer.
    #[must_use]
    pub fn joy(self) -> u8 {
        self.joy
    }
}

impl fmt::Display for EmotionIntensities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Anger: {}, Sadness: {}, Joy: {}",
            self.anger, self.sadness, self.joy
        )
    }
}

// ---------------------------------------------------------------------------
// Conversation Turns
// ---------------------------------------------------------------------------

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human side of the chat.
    User,
    /// The role-played character.
    Assistant,
}

impl Role {
    /// Lowercase storage form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = MoodzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(MoodzError::Serialization(format!(
                "unknown conversation role: '{other}'"
            ))),
        }
    }
}

/// One persisted message in a conversation.
///
/// User turns always carry `0/0/0`; assistant turns carry the intensities
/// that shaped the reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Who the conversation belongs to.
    pub user_id: String,
    /// The character being role-played.
    pub character: String,
    /// Author of this message.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// Anger annotation (0 on user turns).
    pub anger: u8,
    /// Sadness annotation (0 on user turns).
    pub sadness: u8,
    /// Joy annotation (0 on user turns).
    pub joy: u8,
    /// Wall-clock time the message was recorded.
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// A user message, stamped now, with zero intensities.
    #[must_use]
    pub fn user(
        user_id: impl Into<String>,
        character: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            character: character.into(),
            role: Role::User,
            content: content.into(),
            anger: 0,
            sadness: 0,
            joy: 0,
            timestamp: Utc::now(),
        }
    }

    /// An assistant reply, stamped now, annotated with `intensities`.
    #[must_use]
    pub fn assistant(
        user_id: impl Into<String>,
        character: impl Into<String>,
        content: impl Into<String>,
        intensities: EmotionIntensities,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            character: character.into(),
            role: Role::Assistant,
            content: content.into(),
            anger: intensities.anger(),
            sadness: intensities.sadness(),
            joy: intensities.joy(),
            timestamp: Utc::now(),
        }
    }

    /// Override the timestamp (used when replaying or importing history).
    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
