//! Sentiment Adjuster: nudges valence/arousal from the user's last message.
//!
//! A [`PolarityScorer`] rates text in `[-1, 1]`. [`adjust`] maps that score
//! onto one of three bands and shifts the mood:
//!
//! | band                   | valence | arousal |
//! |------------------------|---------|---------|
//! | polarity < -0.3        | −2      | +2      |
//! | -0.3 ≤ polarity ≤ 0.3  | 0       | 0       |
//! | polarity > 0.3         | +2      | +1      |
//!
//! Shifts saturate at the mood bounds `[1, 7]`.
//!
//! The built-in [`LexiconScorer`] is a plain word-list scorer. It averages
//! the polarity of every known word, halves and flips a word under a
//! negator, and amplifies a word behind an intensifier.

use std::collections::HashMap;

use tracing::debug;

use crate::mood::MoodState;
use crate::types::MoodParameter;

/// Polarity below this reads as negative.
pub const NEGATIVE_THRESHOLD: f32 = -0.3;
/// Polarity above this reads as positive.
pub const POSITIVE_THRESHOLD: f32 = 0.3;

/// Anything that can rate how positive a piece of text reads.
pub trait PolarityScorer {
    /// Polarity of `text` in `[-1, 1]`; `0.0` when nothing is recognised.
    fn polarity(&self, text: &str) -> f32;
}

impl<T: PolarityScorer + ?Sized> PolarityScorer for &T {
    fn polarity(&self, text: &str) -> f32 {
        (**self).polarity(text)
    }
}

impl<T: PolarityScorer + ?Sized> PolarityScorer for Box<T> {
    fn polarity(&self, text: &str) -> f32 {
        (**self).polarity(text)
    }
}

/// Which side of the neutral band a polarity falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentBand {
    /// Below [`NEGATIVE_THRESHOLD`].
    Negative,
    /// Inside the closed band `[-0.3, 0.3]`.
    Neutral,
    /// Above [`POSITIVE_THRESHOLD`].
    Positive,
}

/// Classify a polarity score.
#[must_use]
pub fn classify(polarity: f32) -> SentimentBand {
    if polarity < NEGATIVE_THRESHOLD {
        SentimentBand::Negative
    } else if polarity > POSITIVE_THRESHOLD {
        SentimentBand::Positive
    } else {
        SentimentBand::Neutral
    }
}

/// Score `text` and shift `mood` accordingly.
pub fn adjust<S: PolarityScorer + ?Sized>(mood: &mut MoodState, text: &str, scorer: &S) {
    let polarity = scorer.polarity(text);
    let band = classify(polarity);
    match band {
        SentimentBand::Negative => {
            mood.nudge(MoodParameter::Valence, -2);
            mood.nudge(MoodParameter::Arousal, 2);
        }
        SentimentBand::Positive => {
            mood.nudge(MoodParameter::Valence, 2);
            mood.nudge(MoodParameter::Arousal, 1);
        }
        SentimentBand::Neutral => {}
    }
    debug!(
        polarity,
        ?band,
        valence = mood.valence(),
        arousal = mood.arousal(),
        "Sentiment adjustment"
    );
}

// ---------------------------------------------------------------------------
// LexiconScorer
// ---------------------------------------------------------------------------

/// Built-in English polarity lexicon.
const LEXICON: &[(&str, f32)] = &[
    // positive
    ("good", 0.7),
    ("great", 0.8),
    ("excellent", 1.0),
    ("wonderful", 1.0),
    ("amazing", 0.6),
    ("awesome", 1.0),
    ("fantastic", 0.4),
    ("brilliant", 0.9),
    ("perfect", 1.0),
    ("best", 1.0),
    ("better", 0.5),
    ("happy", 0.8),
    ("glad", 0.5),
    ("cheerful", 0.5),
    ("delightful", 1.0),
    ("delighted", 0.7),
    ("pleasant", 0.73),
    ("lovely", 0.5),
    ("love", 0.5),
    ("loved", 0.7),
    ("nice", 0.6),
    ("kind", 0.6),
    ("friendly", 0.375),
    ("beautiful", 0.85),
    ("brave", 0.8),
    ("clever", 0.5),
    ("fun", 0.3),
    ("funny", 0.25),
    ("enjoy", 0.4),
    ("enjoyed", 0.4),
    ("thanks", 0.2),
    ("thank", 0.2),
    ("grateful", 0.6),
    ("proud", 0.8),
    ("calm", 0.3),
    ("safe", 0.5),
    ("hope", 0.3),
    ("impressive", 1.0),
    ("fine", 0.4167),
    ("cool", 0.35),
    // negative
    ("bad", -0.7),
    ("worse", -0.4),
    ("worst", -1.0),
    ("terrible", -1.0),
    ("awful", -1.0),
    ("horrible", -1.0),
    ("dreadful", -1.0),
    ("disgusting", -1.0),
    ("pathetic", -1.0),
    ("miserable", -1.0),
    ("evil", -1.0),
    ("cruel", -1.0),
    ("nasty", -1.0),
    ("boring", -1.0),
    ("hate", -0.8),
    ("hated", -0.8),
    ("hateful", -0.8),
    ("annoying", -0.8),
    ("annoyed", -0.6),
    ("angry", -0.5),
    ("furious", -0.9),
    ("stupid", -0.8),
    ("idiot", -0.8),
    ("dumb", -0.375),
    ("useless", -0.5),
    ("sad", -0.5),
    ("ugly", -0.7),
    ("wrong", -0.5),
    ("poor", -0.4),
    ("rude", -0.3),
    ("mean", -0.3125),
    ("lousy", -0.5),
    ("sick", -0.7143),
    ("disappointing", -0.6),
    ("disappointed", -0.75),
    ("liar", -0.6),
    ("coward", -0.7),
    ("shut", -0.3),
];

/// Words that flip the next scored word.
const NEGATORS: &[&str] = &["not", "no", "never", "nor", "hardly", "without"];

/// Words that scale the next scored word.
const INTENSIFIERS: &[(&str, f32)] = &[
    ("very", 1.3),
    ("really", 1.3),
    ("so", 1.2),
    ("too", 1.2),
    ("extremely", 1.5),
    ("incredibly", 1.5),
    ("absolutely", 1.4),
    ("totally", 1.3),
    ("quite", 1.1),
];

/// Multiplier applied to a word under negation.
const NEGATION_FACTOR: f32 = -0.5;

/// How many tokens a negator reaches forward.
const NEGATION_WINDOW: usize = 3;

/// Lexicon-based polarity scorer.
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    lexicon: HashMap<String, f32>,
    intensifiers: HashMap<String, f32>,
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self {
            lexicon: LEXICON.iter().map(|&(w, s)| (w.to_string(), s)).collect(),
            intensifiers: INTENSIFIERS
                .iter()
                .map(|&(w, s)| (w.to_string(), s))
                .collect(),
        }
    }
}

impl LexiconScorer {
    /// Scorer with the built-in English lexicon.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or override lexicon entries. Scores are clamped to `[-1, 1]`.
    #[must_use]
    pub fn with_entries<'a>(mut self, entries: impl IntoIterator<Item = (&'a str, f32)>) -> Self {
        for (word, score) in entries {
            self.lexicon
                .insert(word.to_lowercase(), score.clamp(-1.0, 1.0));
        }
        self
    }

    /// Number of scored words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lexicon.len()
    }

    /// Whether the lexicon is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lexicon.is_empty()
    }
}

fn is_negator(token: &str) -> bool {
    NEGATORS.contains(&token) || token.ends_with("n't")
}

/// Typographic right single quote, as typed by most phone keyboards.
const CURLY_APOSTROPHE: char = '\u{2019}';

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == CURLY_APOSTROPHE))
        .filter(|t| !t.is_empty())
        .map(|t| t.replace(CURLY_APOSTROPHE, "'").trim_matches('\'').to_lowercase())
        .filter(|t| !t.is_empty())
}

impl PolarityScorer for LexiconScorer {
    fn polarity(&self, text: &str) -> f32 {
        let mut scores: Vec<f32> = Vec::new();
        let mut negation_left = 0_usize;
        let mut boost = 1.0_f32;

        for token in tokenize(text) {
            if is_negator(&token) {
                negation_left = NEGATION_WINDOW;
                continue;
            }
            if let Some(&factor) = self.intensifiers.get(&token) {
                boost *= factor;
                continue;
            }
            if let Some(&score) = self.lexicon.get(&token) {
                let mut s = (score * boost).clamp(-1.0, 1.0);
                if negation_left > 0 {
                    s *= NEGATION_FACTOR;
                }
                scores.push(s);
                negation_left = 0;
                boost = 1.0;
                continue;
            }
            negation_left = negation_left.saturating_sub(1);
            boost = 1.0;
        }

        if scores.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = scores.iter().sum::<f32>() / scores.len() as f32;
        mean.clamp(-1.0, 1.0)
    }
}
