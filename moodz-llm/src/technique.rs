//! Per-exchange generation settings: prompting technique, conversational
//! style (temperature) and response length (token cap).
//!
//! A technique adds one sentence to the character's system prompt and may
//! wrap the user's words in a scaffold. Style and length presets override
//! the client's configured temperature and token limit for one call; left
//! unset, the configured values apply.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::types::GenerationOptions;

/// Lowercase, with spaces and hyphens folded to underscores, so both the
/// snake_case key and the human label parse.
fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

fn unknown(kind: &str, value: &str, keys: impl Iterator<Item = &'static str>) -> LlmError {
    let known = keys.collect::<Vec<_>>().join(", ");
    LlmError::ConfigError(format!("unknown {kind} '{value}' (expected one of: {known})"))
}

// ---------------------------------------------------------------------------
// Prompting technique
// ---------------------------------------------------------------------------

/// How the character is asked to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptTechnique {
    /// Answer directly.
    #[default]
    ZeroShot,
    /// Reason step by step through a fixed scaffold.
    ChainOfThought,
    /// Answer, critique, improve.
    SelfReflection,
    /// Answer in bullet points.
    DeliberateStructure,
    /// Ask clarifying questions first.
    MultiTurnRefinement,
}

impl PromptTechnique {
    /// Every technique, in menu order.
    pub const ALL: [Self; 5] = [
        Self::ZeroShot,
        Self::ChainOfThought,
        Self::SelfReflection,
        Self::DeliberateStructure,
        Self::MultiTurnRefinement,
    ];

    /// snake_case key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::ZeroShot => "zero_shot",
            Self::ChainOfThought => "chain_of_thought",
            Self::SelfReflection => "self_reflection",
            Self::DeliberateStructure => "deliberate_structure",
            Self::MultiTurnRefinement => "multi_turn_refinement",
        }
    }

    /// Menu label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::ZeroShot => "Zero-shot",
            Self::ChainOfThought => "Chain-of-thought",
            Self::SelfReflection => "Self-reflection",
            Self::DeliberateStructure => "Deliberate structure",
            Self::MultiTurnRefinement => "Multi-turn refinement",
        }
    }

    /// One-line description shown next to the menu.
    #[must_use]
    pub fn strategy(self) -> &'static str {
        match self {
            Self::ZeroShot => "Answer directly without examples.",
            Self::ChainOfThought => "Break down reasoning step by step.",
            Self::SelfReflection => "Generate, critique, and refine response.",
            Self::DeliberateStructure => {
                "Respond in a requested format (bullets, poem, story, etc.)."
            }
            Self::MultiTurnRefinement => "Let the user refine their query iteratively.",
        }
    }

    /// Sentence appended to the persona, if any.
    #[must_use]
    pub fn system_suffix(self) -> Option<&'static str> {
        match self {
            Self::ZeroShot => None,
            Self::ChainOfThought => Some("Think step-by-step before answering."),
            Self::SelfReflection => {
                Some("First, answer. Then, review your own response and improve it.")
            }
            Self::DeliberateStructure => Some("Respond in bullet points."),
            Self::MultiTurnRefinement => Some("Ask clarifying questions before answering."),
        }
    }

    /// The user message actually sent for `prompt`.
    #[must_use]
    pub fn wrap_user(self, prompt: &str) -> String {
        match self {
            Self::ZeroShot | Self::DeliberateStructure => prompt.to_string(),
            Self::ChainOfThought => format!(
                "Step 1: Identify the key idea.\n\
                 Step 2: Explain using a simple analogy.\n\
                 Step 3: Give a real-world example.\n\
                 Now, answer this: {prompt}"
            ),
            Self::SelfReflection => {
                format!("Initial Answer:\n\nNow reflect and improve your response: {prompt}")
            }
            Self::MultiTurnRefinement => {
                format!("Ask me to refine my question before you answer: {prompt}")
            }
        }
    }
}

impl fmt::Display for PromptTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PromptTechnique {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Self::ALL
            .into_iter()
            .find(|t| t.key() == wanted)
            .ok_or_else(|| unknown("prompting technique", s, Self::ALL.into_iter().map(Self::key)))
    }
}

// ---------------------------------------------------------------------------
// Conversational style
// ---------------------------------------------------------------------------

/// Temperature preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStyle {
    /// 1.0
    VeryDynamic,
    /// 0.7
    Balanced,
    /// 0.3
    Realistic,
    /// 0.2
    HistoricalAccuracy,
}

impl ResponseStyle {
    /// Every preset, hottest first.
    pub const ALL: [Self; 4] = [
        Self::VeryDynamic,
        Self::Balanced,
        Self::Realistic,
        Self::HistoricalAccuracy,
    ];

    /// snake_case key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::VeryDynamic => "very_dynamic",
            Self::Balanced => "balanced",
            Self::Realistic => "realistic",
            Self::HistoricalAccuracy => "historical_accuracy",
        }
    }

    /// Menu label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::VeryDynamic => "Very Dynamic",
            Self::Balanced => "Balanced",
            Self::Realistic => "Realistic",
            Self::HistoricalAccuracy => "Historical Accuracy",
        }
    }

    /// Sampling temperature for this preset.
    #[must_use]
    pub fn temperature(self) -> f32 {
        match self {
            Self::VeryDynamic => 1.0,
            Self::Balanced => 0.7,
            Self::Realistic => 0.3,
            Self::HistoricalAccuracy => 0.2,
        }
    }
}

impl fmt::Display for ResponseStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.temperature())
    }
}

impl FromStr for ResponseStyle {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Self::ALL
            .into_iter()
            .find(|p| p.key() == wanted)
            .ok_or_else(|| unknown("response style", s, Self::ALL.into_iter().map(Self::key)))
    }
}

// ---------------------------------------------------------------------------
// Response length
// ---------------------------------------------------------------------------

/// Token-cap preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseLength {
    /// 50 tokens.
    Concise,
    /// 150 tokens.
    Balanced,
    /// 300 tokens.
    InDepth,
}

impl ResponseLength {
    /// Every preset, shortest first.
    pub const ALL: [Self; 3] = [Self::Concise, Self::Balanced, Self::InDepth];

    /// snake_case key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Concise => "concise",
            Self::Balanced => "balanced",
            Self::InDepth => "in_depth",
        }
    }

    /// Menu label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Concise => "Concise",
            Self::Balanced => "Balanced",
            Self::InDepth => "In-Depth",
        }
    }

    /// Token cap for this preset.
    #[must_use]
    pub fn max_tokens(self) -> u32 {
        match self {
            Self::Concise => 50,
            Self::Balanced => 150,
            Self::InDepth => 300,
        }
    }
}

impl fmt::Display for ResponseLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} tokens)", self.label(), self.max_tokens())
    }
}

impl FromStr for ResponseLength {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Self::ALL
            .into_iter()
            .find(|p| p.key() == wanted)
            .ok_or_else(|| unknown("response length", s, Self::ALL.into_iter().map(Self::key)))
    }
}

// ---------------------------------------------------------------------------
// Settings bundle
// ---------------------------------------------------------------------------

/// Technique and presets for one exchange.
///
/// `None` for style or length means "use the client's configured value".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Prompting technique.
    pub technique: PromptTechnique,
    /// Temperature preset.
    pub style: Option<ResponseStyle>,
    /// Token-cap preset.
    pub length: Option<ResponseLength>,
}

impl GenerationSettings {
    /// Per-call overrides for the generator.
    #[must_use]
    pub fn options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.style.map(ResponseStyle::temperature),
            max_tokens: self.length.map(ResponseLength::max_tokens),
        }
    }
}

impl fmt::Display for GenerationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.technique)?;
        if let Some(style) = self.style {
            write!(f, ", {style}")?;
        }
        if let Some(length) = self.length {
            write!(f, ", {length}")?;
        }
        Ok(())
    }
}
