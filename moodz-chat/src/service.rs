//! Chat service: upload and exchange.
//!
//! One exchange runs strictly in order:
//!
//! ```text
//! validate → slider update → sentiment → intensities → register
//!          → memory context → system prompt (+ technique) → generate → persist
//! ```
//!
//! The session's mood is committed only after generation succeeds and both
//! turns are stored, so a failed call can be retried without nudging the
//! mood twice or leaving a lone user turn behind.

use moodz_core::recall;
use moodz_core::{
    AffectEngine, ConversationLog, ConversationTurn, EmotionIntensities, MoodUpdate, MoodzConfig,
    Register,
};
use moodz_llm::{GenerationSettings, TextGenerator, prompt};
use serde::Serialize;
use tracing::{info, warn};

use crate::document;
use crate::error::{ChatError, Result};
use crate::roster::{self, CharacterRoster};
use crate::session::ChatSession;

/// What an exchange hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangeReply {
    /// The character's reply.
    pub response: String,
    /// Intensities that shaped the reply.
    pub intensities: EmotionIntensities,
    /// Register the reply was asked to take.
    pub register: Register,
    /// Technique and presets the reply was generated under.
    pub settings: GenerationSettings,
}

/// Upload and exchange operations over a shared generator and log.
///
/// The service holds no per-session state; pass the [`ChatSession`] in.
pub struct ChatService<G> {
    config: MoodzConfig,
    engine: AffectEngine,
    generator: G,
    log: ConversationLog,
}

impl<G> std::fmt::Debug for ChatService<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("engine", &self.engine)
            .field("log", &self.log)
            .finish_non_exhaustive()
    }
}

impl<G: TextGenerator> ChatService<G> {
    /// Assemble a service from its parts. The affect engine is built from
    /// `config`.
    #[must_use]
    pub fn new(config: MoodzConfig, generator: G, log: ConversationLog) -> Self {
        let engine = AffectEngine::from_config(&config);
        Self {
            config,
            engine,
            generator,
            log,
        }
    }

    /// Open the conversation log named in `config.persistence` and
    /// assemble a service.
    ///
    /// # Errors
    /// [`ChatError::Core`] if the log cannot be opened.
    pub fn open(config: MoodzConfig, generator: G) -> Result<Self> {
        let log = ConversationLog::open(&config.persistence.path, &config.persistence)?;
        Ok(Self::new(config, generator, log))
    }

    /// Swap in a different affect engine (custom scorer, say).
    #[must_use]
    pub fn with_engine(mut self, engine: AffectEngine) -> Self {
        self.engine = engine;
        self
    }

    /// The conversation log.
    #[must_use]
    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    /// The text generator.
    #[must_use]
    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &MoodzConfig {
        &self.config
    }

    /// Load a document and replace the session's roster with the
    /// characters found in it.
    ///
    /// On error the previous roster is kept.
    ///
    /// # Errors
    /// [`ChatError::UnsupportedMediaType`], [`ChatError::Document`] or
    /// [`ChatError::UpstreamGeneration`].
    pub async fn upload<'s>(
        &self,
        session: &'s mut ChatSession,
        bytes: &[u8],
        media_type: &str,
    ) -> Result<&'s CharacterRoster> {
        let text = document::load(bytes, media_type)?;
        let roster = roster::extract_characters(
            &self.generator,
            &text,
            self.config.extraction.max_input_chars,
        )
        .await?;

        info!(
            session = %session.id,
            user = %session.user_id,
            characters = roster.len(),
            "Roster replaced"
        );
        session.roster = roster;
        Ok(&session.roster)
    }

    /// Run one exchange with `character`.
    ///
    /// # Errors
    /// [`ChatError::UnknownCharacter`], [`ChatError::EmptyPrompt`],
    /// [`ChatError::Core`] (rejected slider update or log failure) or
    /// [`ChatError::UpstreamGeneration`]. Nothing is persisted and the
    /// mood is unchanged unless generation succeeds.
    pub async fn exchange(
        &self,
        session: &mut ChatSession,
        character: &str,
        user_text: &str,
        update: &MoodUpdate,
    ) -> Result<ExchangeReply> {
        let style = session
            .roster
            .style_of(character)
            .ok_or_else(|| ChatError::UnknownCharacter(character.to_string()))?;
        if user_text.trim().is_empty() {
            return Err(ChatError::EmptyPrompt);
        }

        let mut mood = session.mood;
        let outcome = self.engine.evaluate(&mut mood, update, Some(user_text))?;

        let memory = recall::build_memory_context(
            &self.log,
            &session.user_id,
            character,
            user_text,
            &self.config.memory,
        )?;
        let settings = session.settings;
        let system = prompt::character_system_prompt_with(
            character,
            style,
            outcome.register,
            settings.technique,
            &memory,
        );
        let user = settings.technique.wrap_user(user_text);

        let response = self
            .generator
            .generate_with(&system, &user, settings.options())
            .await
            .map_err(|e| {
                warn!(session = %session.id, character, error = %e, "Generation failed");
                ChatError::UpstreamGeneration(e)
            })?;

        self.log.append_exchange(
            &ConversationTurn::user(&session.user_id, character, user_text),
            &ConversationTurn::assistant(
                &session.user_id,
                character,
                &response,
                outcome.intensities,
            ),
        )?;
        session.mood = mood;

        info!(
            session = %session.id,
            user = %session.user_id,
            character,
            intensities = %outcome.intensities,
            register = %outcome.register,
            technique = settings.technique.key(),
            "Exchange complete"
        );

        Ok(ExchangeReply {
            response,
            intensities: outcome.intensities,
            register: outcome.register,
            settings,
        })
    }
}
