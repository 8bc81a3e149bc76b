//! Emotion Calculator: mood sliders → anger / sadness / joy.
//!
//! Each intensity is the truncated mean of three slider terms, saturated
//! into `[1, 5]`:
//!
//! ```text
//! anger   = (arousal + (7 - valence) + selection_threshold) / 3
//! sadness = ((7 - arousal) + (7 - valence) + (7 - goal_directedness)) / 3
//! joy     = (valence + arousal + securing_rate) / 3
//! ```
//!
//! `resolution_level` does not appear in any term.

use crate::mood::MoodState;
use crate::types::{EmotionIntensities, INTENSITY_MAX, INTENSITY_MIN, MOOD_MAX, MoodParameter};

/// Truncated mean of three terms, saturated into `[1, 5]`.
fn mean3(a: u8, b: u8, c: u8) -> u8 {
    // Terms are each in [0, 7], so the sum fits in a u8 and division truncates.
    ((a + b + c) / 3).clamp(INTENSITY_MIN, INTENSITY_MAX)
}

/// Flip a slider around the top of the scale (`7 - v`).
fn inverted(v: u8) -> u8 {
    MOOD_MAX - v
}

/// Anger intensity for `mood`.
#[must_use]
pub fn anger(mood: &MoodState) -> u8 {
    mean3(
        mood.arousal(),
        inverted(mood.valence()),
        mood.get(MoodParameter::SelectionThreshold),
    )
}

/// Sadness intensity for `mood`.
#[must_use]
pub fn sadness(mood: &MoodState) -> u8 {
    mean3(
        inverted(mood.arousal()),
        inverted(mood.valence()),
        inverted(mood.get(MoodParameter::GoalDirectedness)),
    )
}

/// Joy intensity for `mood`.
#[must_use]
pub fn joy(mood: &MoodState) -> u8 {
    mean3(
        mood.valence(),
        mood.arousal(),
        mood.get(MoodParameter::SecuringRate),
    )
}

/// Compute all three intensities for `mood`.
#[must_use]
pub fn calculate(mood: &MoodState) -> EmotionIntensities {
    EmotionIntensities::new(anger(mood), sadness(mood), joy(mood))
}
