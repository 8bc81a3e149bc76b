//! Turn pipeline: update → sentiment → calculate → register.
//!
//! [`AffectEngine`] holds the per-process policy (scorer, whether sentiment
//! is on). The mood itself is always passed in by the caller, so each
//! session keeps its own [`MoodState`] and nothing is shared between them.

use tracing::debug;

use crate::config::MoodzConfig;
use crate::emotion;
use crate::error::Result;
use crate::mood::{MoodState, MoodUpdate};
use crate::sentiment::{self, LexiconScorer, PolarityScorer};
use crate::style::{Register, select_style};
use crate::types::EmotionIntensities;

/// Result of evaluating one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Intensities computed from the post-adjustment mood.
    pub intensities: EmotionIntensities,
    /// Register selected from those intensities.
    pub register: Register,
}

/// Stateless turn evaluator.
pub struct AffectEngine {
    scorer: Box<dyn PolarityScorer + Send + Sync>,
    sentiment_enabled: bool,
    reject_unknown_keys: bool,
}

impl std::fmt::Debug for AffectEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AffectEngine")
            .field("sentiment_enabled", &self.sentiment_enabled)
            .field("reject_unknown_keys", &self.reject_unknown_keys)
            .finish_non_exhaustive()
    }
}

impl Default for AffectEngine {
    fn default() -> Self {
        Self::new(LexiconScorer::new())
    }
}

impl AffectEngine {
    /// Engine with sentiment adjustment through `scorer`.
    #[must_use]
    pub fn new(scorer: impl PolarityScorer + Send + Sync + 'static) -> Self {
        Self {
            scorer: Box::new(scorer),
            sentiment_enabled: true,
            reject_unknown_keys: false,
        }
    }

    /// Engine configured from the `[mood]` and `[sentiment]` sections,
    /// using the built-in lexicon scorer.
    #[must_use]
    pub fn from_config(config: &MoodzConfig) -> Self {
        Self::new(LexiconScorer::new())
            .with_sentiment(config.sentiment.enabled)
            .with_reject_unknown_keys(config.mood.reject_unknown_keys)
    }

    /// Turn sentiment adjustment on or off.
    #[must_use]
    pub fn with_sentiment(mut self, enabled: bool) -> Self {
        self.sentiment_enabled = enabled;
        self
    }

    /// Reject unknown slider keys in [`AffectEngine::parse_update`].
    #[must_use]
    pub fn with_reject_unknown_keys(mut self, reject: bool) -> Self {
        self.reject_unknown_keys = reject;
        self
    }

    /// Parse a caller-supplied JSON slider object under this engine's
    /// unknown-key policy.
    ///
    /// # Errors
    /// Returns [`crate::MoodzError::InvalidParameter`] for malformed input.
    pub fn parse_update(&self, value: &serde_json::Value) -> Result<MoodUpdate> {
        MoodUpdate::from_json(value, self.reject_unknown_keys)
    }

    /// Apply the slider update, nudge from `latest_user_text` (when given
    /// and sentiment is enabled), then compute the intensities.
    ///
    /// # Errors
    /// Returns [`crate::MoodzError::InvalidParameter`] if the update is
    /// rejected; in that case `mood` is left unchanged.
    pub fn apply_turn(
        &self,
        mood: &mut MoodState,
        update: &MoodUpdate,
        latest_user_text: Option<&str>,
    ) -> Result<EmotionIntensities> {
        mood.update(update)?;
        if self.sentiment_enabled {
            if let Some(text) = latest_user_text {
                sentiment::adjust(mood, text, &self.scorer);
            }
        }
        let intensities = emotion::calculate(mood);
        debug!(%intensities, "Turn intensities computed");
        Ok(intensities)
    }

    /// [`AffectEngine::apply_turn`] followed by [`select_style`].
    ///
    /// # Errors
    /// Same as [`AffectEngine::apply_turn`].
    pub fn evaluate(
        &self,
        mood: &mut MoodState,
        update: &MoodUpdate,
        latest_user_text: Option<&str>,
    ) -> Result<TurnOutcome> {
        let intensities = self.apply_turn(mood, update, latest_user_text)?;
        Ok(TurnOutcome {
            intensities,
            register: select_style(intensities),
        })
    }
}
