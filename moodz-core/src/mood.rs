//! Mood State: the six bounded sliders a session carries between turns.
//!
//! A [`MoodState`] starts at the neutral midpoint (4 on every slider) and is
//! only ever changed through [`MoodState::update`] (caller-supplied sliders)
//! or [`MoodState::nudge`] (sentiment adjustment). Both keep every value in
//! `[1, 7]`.

use serde::Serialize;
use tracing::debug;

use crate::error::{MoodzError, Result};
use crate::types::{MOOD_DEFAULT, MOOD_MAX, MOOD_MIN, MoodParameter};

/// Per-session mood: six integer parameters in `[1, 7]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MoodState {
    valence: u8,
    arousal: u8,
    selection_threshold: u8,
    resolution_level: u8,
    goal_directedness: u8,
    securing_rate: u8,
}

impl Default for MoodState {
    fn default() -> Self {
        Self {
            valence: MOOD_DEFAULT,
            arousal: MOOD_DEFAULT,
            selection_threshold: MOOD_DEFAULT,
            resolution_level: MOOD_DEFAULT,
            goal_directedness: MOOD_DEFAULT,
            securing_rate: MOOD_DEFAULT,
        }
    }
}

impl MoodState {
    /// A fresh, neutral mood.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of one parameter.
    #[must_use]
    pub fn get(&self, param: MoodParameter) -> u8 {
        match param {
            MoodParameter::Valence => self.valence,
            MoodParameter::Arousal => self.arousal,
            MoodParameter::SelectionThreshold => self.selection_threshold,
            MoodParameter::ResolutionLevel => self.resolution_level,
            MoodParameter::GoalDirectedness => self.goal_directedness,
            MoodParameter::SecuringRate => self.securing_rate,
        }
    }

    /// Shorthand for `get(MoodParameter::Valence)`.
    #[must_use]
    pub fn valence(&self) -> u8 {
        self.valence
    }

    /// Shorthand for `get(MoodParameter::Arousal)`.
    #[must_use]
    pub fn arousal(&self) -> u8 {
        self.arousal
    }

    fn slot(&mut self, param: MoodParameter) -> &mut u8 {
        match param {
            MoodParameter::Valence => &mut self.valence,
            MoodParameter::Arousal => &mut self.arousal,
            MoodParameter::SelectionThreshold => &mut self.selection_threshold,
            MoodParameter::ResolutionLevel => &mut self.resolution_level,
            MoodParameter::GoalDirectedness => &mut self.goal_directedness,
            MoodParameter::SecuringRate => &mut self.securing_rate,
        }
    }

    /// Set one parameter, saturating into `[1, 7]`.
    pub fn set(&mut self, param: MoodParameter, value: u8) {
        *self.slot(param) = value.clamp(MOOD_MIN, MOOD_MAX);
    }

    /// Shift one parameter by `delta`, saturating at the bounds.
    pub fn nudge(&mut self, param: MoodParameter, delta: i8) {
        let slot = self.slot(param);
        let moved = i16::from(*slot) + i16::from(delta);
        let clamped = moved.clamp(i16::from(MOOD_MIN), i16::from(MOOD_MAX));
        *slot = u8::try_from(clamped).unwrap_or(MOOD_DEFAULT);
    }

    /// Apply a partial update.
    ///
    /// Every value is checked before anything is written, so a rejected
    /// update leaves the state untouched. Keys absent from the update keep
    /// their previous value; when a key repeats, the last value wins.
    ///
    /// # Errors
    ///
    /// Returns [`MoodzError::InvalidParameter`] if any value lies outside
    /// `[1, 7]`.
    pub fn update(&mut self, update: &MoodUpdate) -> Result<()> {
        let mut validated = Vec::with_capacity(update.entries.len());
        for &(param, raw) in &update.entries {
            let value = u8::try_from(raw)
                .ok()
                .filter(|v| (MOOD_MIN..=MOOD_MAX).contains(v))
                .ok_or_else(|| MoodzError::InvalidParameter {
                    name: param.key().to_string(),
                    reason: format!("{raw} is outside [{MOOD_MIN}, {MOOD_MAX}]"),
                })?;
            validated.push((param, value));
        }

        for (param, value) in validated {
            self.set(param, value);
        }

        debug!(changed = update.entries.len(), mood = ?self, "Mood updated");
        Ok(())
    }

    /// Iterate `(parameter, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (MoodParameter, u8)> + '_ {
        MoodParameter::ALL.into_iter().map(|p| (p, self.get(p)))
    }
}

/// A partial slider update: an ordered list of `(parameter, raw value)`.
///
/// Values are kept raw (`i64`) so range checking happens in one place,
/// [`MoodState::update`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoodUpdate {
    entries: Vec<(MoodParameter, i64)>,
}

impl MoodUpdate {
    /// An empty update (leaves every parameter unchanged).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one parameter to the update.
    #[must_use]
    pub fn with(mut self, param: MoodParameter, value: i64) -> Self {
        self.entries.push((param, value));
        self
    }

    /// Build an update from string keys.
    ///
    /// Unknown keys are skipped unless `reject_unknown` is set.
    ///
    /// # Errors
    ///
    /// Returns [`MoodzError::InvalidParameter`] for an unknown key when
    /// `reject_unknown` is `true`.
    pub fn from_pairs<K, I>(pairs: I, reject_unknown: bool) -> Result<Self>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, i64)>,
    {
        let mut update = Self::new();
        for (key, value) in pairs {
            match key.as_ref().parse::<MoodParameter>() {
                Ok(param) => update.entries.push((param, value)),
                Err(e) if reject_unknown => return Err(e),
                Err(_) => debug!(key = key.as_ref(), "Ignoring unknown mood key"),
            }
        }
        Ok(update)
    }

    /// Build an update from a JSON object such as
    /// `{"valence": 5, "arousal": 2}`.
    ///
    /// # Errors
    ///
    /// Returns [`MoodzError::InvalidParameter`] if the value is not an
    /// object, if a known key maps to a non-integer, or (with
    /// `reject_unknown`) if a key is unknown.
    pub fn from_json(value: &serde_json::Value, reject_unknown: bool) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| MoodzError::InvalidParameter {
            name: "parameters".to_string(),
            reason: "expected a JSON object".to_string(),
        })?;

        let mut pairs = Vec::with_capacity(object.len());
        for (key, raw) in object {
            if let Err(e) = key.parse::<MoodParameter>() {
                if reject_unknown {
                    return Err(e);
                }
                debug!(key = %key, "Ignoring unknown mood key");
                continue;
            }
            let value = raw.as_i64().ok_or_else(|| MoodzError::InvalidParameter {
                name: key.clone(),
                reason: format!("expected an integer, got {raw}"),
            })?;
            pairs.push((key.as_str(), value));
        }
        Self::from_pairs(pairs, reject_unknown)
    }

    /// Append every entry of `other` after this update's entries.
    #[must_use]
    pub fn merged(mut self, other: &Self) -> Self {
        self.entries.extend_from_slice(&other.entries);
        self
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_neutral() {
        let mood = MoodState::new();
        assert!(mood.iter().all(|(_, v)| v == 4));
    }

    #[test]
    fn partial_update_leaves_other_keys() {
        let mut mood = MoodState::new();
        let update = MoodUpdate::new().with(MoodParameter::Valence, 6);
        mood.update(&update).expect("valid update");
        assert_eq!(mood.valence(), 6);
        assert_eq!(mood.arousal(), 4);
        assert_eq!(mood.get(MoodParameter::SecuringRate), 4);
    }

    #[test]
    fn out_of_range_rejected_atomically() {
        let mut mood = MoodState::new();
        let update = MoodUpdate::new()
            .with(MoodParameter::Valence, 2)
            .with(MoodParameter::Arousal, 9);
        let err = mood.update(&update).expect_err("should fail");
        assert!(matches!(err, MoodzError::InvalidParameter { ref name, .. } if name == "arousal"));
        assert_eq!(mood, MoodState::new(), "nothing applied on rejection");
    }

    #[test]
    fn zero_and_negative_rejected() {
        let mut mood = MoodState::new();
        assert!(mood.update(&MoodUpdate::new().with(MoodParameter::Valence, 0)).is_err());
        assert!(mood.update(&MoodUpdate::new().with(MoodParameter::Valence, -3)).is_err());
    }

    #[test]
    fn last_write_wins_within_one_update() {
        let mut mood = MoodState::new();
        let update = MoodUpdate::new()
            .with(MoodParameter::Arousal, 2)
            .with(MoodParameter::Arousal, 6);
        mood.update(&update).expect("valid");
        assert_eq!(mood.arousal(), 6);
    }

    #[test]
    fn unknown_keys_ignored_by_default() {
        let update = MoodUpdate::from_pairs([("valence", 5), ("mystery", 3)], false)
            .expect("lenient");
        assert_eq!(update.len(), 1);
    }

    #[test]
    fn unknown_keys_rejected_when_strict() {
        let err = MoodUpdate::from_pairs([("mystery", 3)], true).expect_err("should fail");
        assert!(matches!(err, MoodzError::InvalidParameter { .. }));
    }

    #[test]
    fn json_update_parses_known_keys() {
        let update = MoodUpdate::from_json(
            &json!({"valence": 2, "goal_directedness": 7, "theme": "dark"}),
            false,
        )
        .expect("lenient json");
        let mut mood = MoodState::new();
        mood.update(&update).expect("in range");
        assert_eq!(mood.valence(), 2);
        assert_eq!(mood.get(MoodParameter::GoalDirectedness), 7);
    }

    #[test]
    fn json_non_integer_is_malformed() {
        let err = MoodUpdate::from_json(&json!({"valence": "high"}), false)
            .expect_err("should fail");
        assert!(matches!(err, MoodzError::InvalidParameter { ref name, .. } if name == "valence"));
        assert!(MoodUpdate::from_json(&json!([1, 2]), false).is_err());
    }

    #[test]
    fn nudge_saturates() {
        let mut mood = MoodState::new();
        mood.nudge(MoodParameter::Valence, -10);
        mood.nudge(MoodParameter::Arousal, 10);
        assert_eq!(mood.valence(), 1);
        assert_eq!(mood.arousal(), 7);
    }

    #[test]
    fn set_saturates() {
        let mut mood = MoodState::new();
        mood.set(MoodParameter::SecuringRate, 0);
        assert_eq!(mood.get(MoodParameter::SecuringRate), 1);
        mood.set(MoodParameter::SecuringRate, 200);
        assert_eq!(mood.get(MoodParameter::SecuringRate), 7);
    }
}
