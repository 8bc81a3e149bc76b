//! Integration Tests: upload → extract → exchange
//!
//! A scripted generator stands in for the model. It answers the extraction
//! prompt with a fixed character list and records every chat prompt, so
//! the tests can inspect exactly what the character was told.

use std::collections::VecDeque;
use std::sync::Mutex;

use moodz_chat::{ChatError, ChatService, ChatSession};
use moodz_core::types::{MoodParameter, Role};
use moodz_core::{ConversationLog, MoodState, MoodUpdate, MoodzConfig, MoodzError, Register};
use moodz_llm::prompt::EXTRACTION_SYSTEM;
use moodz_llm::{
    GenerationOptions, GenerationSettings, LlmError, PromptTechnique, ResponseLength,
    ResponseStyle, TextGenerator,
};

const STORY: &str = "\"You have been in Afghanistan, I perceive,\" said Holmes.\n\
\"How on earth did you know that?\" asked Watson in astonishment.";

const TWO_CHARACTERS: &str = "1. Sherlock Holmes: Precise, clipped and deductive.\n\
2. Dr Watson: Warm, loyal and plain-spoken.";

struct Scripted {
    extraction_reply: String,
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<(String, String)>>,
    options: Mutex<Vec<GenerationOptions>>,
}

impl Scripted {
    fn new(extraction_reply: &str) -> Self {
        Self {
            extraction_reply: extraction_reply.to_string(),
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            options: Mutex::new(Vec::new()),
        }
    }

    fn then(self, reply: Result<&str, LlmError>) -> Self {
        self.replies
            .lock()
            .expect("lock")
            .push_back(reply.map(str::to_string));
        self
    }

    fn last_user_prompt(&self) -> String {
        self.prompts
            .lock()
            .expect("lock")
            .last()
            .map(|(_, user)| user.clone())
            .expect("at least one chat prompt")
    }

    fn last_options(&self) -> GenerationOptions {
        self.options
            .lock()
            .expect("lock")
            .last()
            .copied()
            .expect("at least one chat call")
    }

    fn last_system_prompt(&self) -> String {
        self.prompts
            .lock()
            .expect("lock")
            .last()
            .map(|(system, _)| system.clone())
            .expect("at least one chat prompt")
    }
}

impl TextGenerator for Scripted {
    async fn generate(&self, system: &str, user: &str) -> Result<String, LlmError> {
        if system == EXTRACTION_SYSTEM {
            return Ok(self.extraction_reply.clone());
        }
        self.prompts
            .lock()
            .expect("lock")
            .push((system.to_string(), user.to_string()));
        self.replies
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Ok("Indeed.".to_string()))
    }

    async fn generate_with(
        &self,
        system: &str,
        user: &str,
        options: GenerationOptions,
    ) -> Result<String, LlmError> {
        if system != EXTRACTION_SYSTEM {
            self.options.lock().expect("lock").push(options);
        }
        self.generate(system, user).await
    }
}

fn service(generator: Scripted) -> ChatService<Scripted> {
    let log = ConversationLog::open_in_memory().expect("open log");
    ChatService::new(MoodzConfig::default(), generator, log)
}

async fn uploaded(service: &ChatService<Scripted>, user: &str) -> ChatSession {
    let mut session = ChatSession::new(user);
    service
        .upload(&mut session, STORY.as_bytes(), "text/plain")
        .await
        .expect("upload");
    session
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upload_extracts_two_characters_and_rejects_a_third() {
    let service = service(Scripted::new(TWO_CHARACTERS));
    let mut session = uploaded(&service, "ada").await;

    assert_eq!(
        session.roster.names().collect::<Vec<_>>(),
        ["Sherlock Holmes", "Dr Watson"]
    );

    let err = service
        .exchange(&mut session, "Mrs Hudson", "Tea, please.", &MoodUpdate::new())
        .await
        .expect_err("not in roster");
    assert!(matches!(err, ChatError::UnknownCharacter(name) if name == "Mrs Hudson"));
    assert!(service.log().is_empty().expect("count"));
}

#[tokio::test]
async fn unparseable_extraction_gives_empty_roster() {
    let service = service(Scripted::new("Sorry, I found nobody of note."));
    let session = uploaded(&service, "ada").await;
    assert!(session.roster.is_empty());
}

#[tokio::test]
async fn failed_upload_keeps_previous_roster() {
    let service = service(Scripted::new(TWO_CHARACTERS));
    let mut session = uploaded(&service, "ada").await;

    let err = service
        .upload(&mut session, b"<p>hi</p>", "text/html")
        .await
        .expect_err("html");
    assert!(matches!(err, ChatError::UnsupportedMediaType(_)));
    assert_eq!(session.roster.len(), 2);
}

// ---------------------------------------------------------------------------
// Exchange
// ---------------------------------------------------------------------------

#[tokio::test]
async fn exchange_persists_user_then_assistant() {
    let service = service(Scripted::new(TWO_CHARACTERS).then(Ok("Elementary.")));
    let mut session = uploaded(&service, "ada").await;

    let reply = service
        .exchange(&mut session, "Sherlock Holmes", "Good evening.", &MoodUpdate::new())
        .await
        .expect("exchange");
    assert_eq!(reply.response, "Elementary.");

    let history = service.log().history("ada").expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[0].content, "Good evening.");
    assert_eq!((history[0].anger, history[0].sadness, history[0].joy), (0, 0, 0));
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].content, "Elementary.");
    assert_eq!(
        (history[1].anger, history[1].sadness, history[1].joy),
        (
            reply.intensities.anger(),
            reply.intensities.sadness(),
            reply.intensities.joy()
        )
    );
}

#[tokio::test]
async fn first_prompt_carries_persona_and_no_history() {
    let service = service(Scripted::new(TWO_CHARACTERS));
    let mut session = uploaded(&service, "ada").await;

    let reply = service
        .exchange(&mut session, "Dr Watson", "Good evening.", &MoodUpdate::new())
        .await
        .expect("exchange");
    // "Good" reads positive: valence 6, arousal 5, so joy is 5.
    assert_eq!(reply.register, Register::Joyful);

    let collected = service_prompt(&service);
    assert!(collected.starts_with(
        "You are Dr Watson from the uploaded fiction. Warm, loyal and plain-spoken. "
    ));
    assert!(collected.contains("You are cheerful and excited."));
    assert!(collected.ends_with("We haven't chatted much yet!"));
}

#[tokio::test]
async fn hostile_text_makes_the_character_irritated() {
    let service = service(Scripted::new(TWO_CHARACTERS));
    let mut session = uploaded(&service, "ada").await;

    let reply = service
        .exchange(
            &mut session,
            "Sherlock Holmes",
            "You are a stupid, arrogant fraud and I hate you.",
            &MoodUpdate::new(),
        )
        .await
        .expect("exchange");
    assert_eq!(reply.register, Register::Irritated);
    assert!(service_prompt(&service).contains("Let the user know you're angry"));
    assert_eq!(session.mood.valence(), 2);
    assert_eq!(session.mood.arousal(), 6);
}

#[tokio::test]
async fn second_exchange_remembers_the_first() {
    let service = service(
        Scripted::new(TWO_CHARACTERS)
            .then(Ok("Elementary."))
            .then(Ok("As I said.")),
    );
    let mut session = uploaded(&service, "ada").await;

    service
        .exchange(&mut session, "Sherlock Holmes", "Good evening.", &MoodUpdate::new())
        .await
        .expect("first");
    service
        .exchange(&mut session, "Sherlock Holmes", "Say that again?", &MoodUpdate::new())
        .await
        .expect("second");

    let prompt = service_prompt(&service);
    assert!(prompt.contains("Here's what we've talked about recently: "));
    assert!(prompt.contains("user: Good evening. (Anger: 0, Sadness: 0, Joy: 0)"));
    assert!(prompt.contains("assistant: Elementary. (Anger: "));
    assert!(!prompt.contains("Say that again?"), "current turn is not history yet");
}

#[tokio::test]
async fn recall_reaches_other_users_conversations() {
    let service = service(Scripted::new(TWO_CHARACTERS));
    let mut brian = uploaded(&service, "brian").await;
    service
        .exchange(&mut brian, "Dr Watson", "Moriarty was seen in Baker Street.", &MoodUpdate::new())
        .await
        .expect("brian");

    let mut ada = uploaded(&service, "ada").await;
    service
        .exchange(&mut ada, "Sherlock Holmes", "Do you know Moriarty?", &MoodUpdate::new())
        .await
        .expect("ada");

    let prompt = service_prompt(&service);
    assert!(prompt.contains("We haven't chatted much yet! I also recall: "));
    assert!(prompt.contains("Dr Watson said 'Moriarty was seen in Baker Street.' to brian on "));

    service
        .exchange(&mut ada, "Sherlock Holmes", "Do you know Mycroft?", &MoodUpdate::new())
        .await
        .expect("ada again");
    assert!(service_prompt(&service)
        .ends_with(" I don't recall anyone named 'mycroft' from past interactions."));
}

#[tokio::test]
async fn slider_update_drives_the_register() {
    let service = service(Scripted::new(TWO_CHARACTERS));
    let mut session = uploaded(&service, "ada").await;

    let update = MoodUpdate::new()
        .with(MoodParameter::Valence, 1)
        .with(MoodParameter::Arousal, 1)
        .with(MoodParameter::GoalDirectedness, 1);
    let reply = service
        .exchange(&mut session, "Dr Watson", "The weather is cloudy.", &update)
        .await
        .expect("exchange");
    assert_eq!(reply.register, Register::Melancholic);
    assert!(service_prompt(&service).contains("feeling down"));
}

#[tokio::test]
async fn technique_and_presets_reach_the_generator() {
    let service = service(Scripted::new(TWO_CHARACTERS));
    let mut session = uploaded(&service, "ada").await;
    session.settings = GenerationSettings {
        technique: PromptTechnique::ChainOfThought,
        style: Some(ResponseStyle::Realistic),
        length: Some(ResponseLength::Concise),
    };

    let reply = service
        .exchange(&mut session, "Sherlock Holmes", "Who is Moriarty?", &MoodUpdate::new())
        .await
        .expect("exchange");
    assert_eq!(reply.settings, session.settings);

    let generator = service.generator();
    let system = generator.last_system_prompt();
    assert!(system.contains("Think step-by-step before answering."));
    let user = generator.last_user_prompt();
    assert!(user.starts_with("Step 1: Identify the key idea."));
    assert!(user.ends_with("Now, answer this: Who is Moriarty?"));
    assert_eq!(
        generator.last_options(),
        GenerationOptions {
            temperature: Some(0.3),
            max_tokens: Some(50),
        }
    );

    let history = service.log().history("ada").expect("history");
    assert_eq!(history[0].content, "Who is Moriarty?", "stored turn keeps the user's words");
}

#[tokio::test]
async fn default_settings_send_plain_prompt_without_overrides() {
    let service = service(Scripted::new(TWO_CHARACTERS));
    let mut session = uploaded(&service, "ada").await;
    service
        .exchange(&mut session, "Dr Watson", "Hello.", &MoodUpdate::new())
        .await
        .expect("exchange");
    assert_eq!(service.generator().last_user_prompt(), "Hello.");
    assert_eq!(service.generator().last_options(), GenerationOptions::default());
}

// ---------------------------------------------------------------------------
// Failures leave no trace
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generation_failure_persists_nothing_and_keeps_mood() {
    let service = service(
        Scripted::new(TWO_CHARACTERS).then(Err(LlmError::Unavailable("offline".into()))),
    );
    let mut session = uploaded(&service, "ada").await;

    let err = service
        .exchange(&mut session, "Sherlock Holmes", "I hate this awful fog.", &MoodUpdate::new())
        .await
        .expect_err("generator down");
    assert!(matches!(err, ChatError::UpstreamGeneration(LlmError::Unavailable(_))));
    assert!(service.log().is_empty().expect("count"));
    assert_eq!(session.mood, MoodState::new());
}

#[tokio::test]
async fn out_of_range_slider_is_rejected() {
    let service = service(Scripted::new(TWO_CHARACTERS));
    let mut session = uploaded(&service, "ada").await;

    let update = MoodUpdate::new().with(MoodParameter::Arousal, 9);
    let err = service
        .exchange(&mut session, "Dr Watson", "Hello.", &update)
        .await
        .expect_err("arousal 9");
    assert!(matches!(err, ChatError::Core(MoodzError::InvalidParameter { .. })));
    assert!(service.log().is_empty().expect("count"));
}

#[tokio::test]
async fn blank_prompt_is_rejected() {
    let service = service(Scripted::new(TWO_CHARACTERS));
    let mut session = uploaded(&service, "ada").await;
    let err = service
        .exchange(&mut session, "Dr Watson", "   ", &MoodUpdate::new())
        .await
        .expect_err("blank");
    assert!(matches!(err, ChatError::EmptyPrompt));
}

// ---------------------------------------------------------------------------
// Log on disk
// ---------------------------------------------------------------------------

#[tokio::test]
async fn service_opens_log_from_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = MoodzConfig::default();
    config.persistence.path = dir
        .path()
        .join("chat_history.db")
        .to_string_lossy()
        .into_owned();

    let service = ChatService::open(config, Scripted::new(TWO_CHARACTERS)).expect("open");
    let mut session = uploaded(&service, "ada").await;
    service
        .exchange(&mut session, "Dr Watson", "Hello.", &MoodUpdate::new())
        .await
        .expect("exchange");
    drop(service);

    let reopened = ConversationLog::open(
        dir.path().join("chat_history.db"),
        &MoodzConfig::default().persistence,
    )
    .expect("reopen");
    assert_eq!(reopened.history("ada").expect("history").len(), 2);
}

#[tokio::test]
async fn failed_reply_write_keeps_mood_and_log_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("chat_history.db");
    let log = ConversationLog::open(&path, &MoodzConfig::default().persistence)
        .expect("open");
    rusqlite::Connection::open(&path)
        .expect("second connection")
        .execute_batch(
            "CREATE TRIGGER reject_replies BEFORE INSERT ON conversations
             WHEN NEW.role = 'assistant'
             BEGIN SELECT RAISE(ABORT, 'replies rejected'); END;",
        )
        .expect("trigger");

    let service = ChatService::new(MoodzConfig::default(), Scripted::new(TWO_CHARACTERS), log);
    let mut session = uploaded(&service, "ada").await;

    let err = service
        .exchange(
            &mut session,
            "Sherlock Holmes",
            "You are a stupid, arrogant fraud and I hate you.",
            &MoodUpdate::new(),
        )
        .await
        .expect_err("reply insert aborts");
    assert!(matches!(err, ChatError::Core(MoodzError::Database(_))));
    assert!(service.log().is_empty().expect("count"));
    assert_eq!(session.mood, MoodState::new());
}

fn service_prompt(service: &ChatService<Scripted>) -> String {
    service.generator().last_system_prompt()
}
