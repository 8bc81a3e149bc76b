//! Memory context: past conversation rendered as prompt text.
//!
//! Two parts are concatenated:
//!
//! - the last few turns between this user and this character, and
//! - when the user asks "do you know ...", what the log remembers about
//!   the term from *any* conversation.

use tracing::debug;

use crate::config::MemoryConfig;
use crate::error::Result;
use crate::history::ConversationLog;
use crate::types::ConversationTurn;

const RECENT_PREFIX: &str = "Here's what we've talked about recently: ";
const NO_HISTORY: &str = "We haven't chatted much yet!";
const RECALL_PREFIX: &str = " I also recall: ";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Extract the recall search term from `prompt`.
///
/// Matching is case-insensitive. The term is whatever follows the *last*
/// occurrence of `trigger`, trimmed, with trailing question marks removed.
/// Returns `None` only when the trigger is absent. A bare trigger ("do you
/// know?") yields an empty term, which matches every stored turn.
#[must_use]
pub fn search_term(prompt: &str, trigger: &str) -> Option<String> {
    let lowered = prompt.to_lowercase();
    let trigger = trigger.to_lowercase();
    if trigger.is_empty() {
        return None;
    }
    let (_, tail) = lowered.rsplit_once(trigger.as_str())?;
    Some(tail.trim().trim_end_matches('?').trim_end().to_string())
}

fn render_recent(turn: &ConversationTurn) -> String {
    format!(
        "{}: {} (Anger: {}, Sadness: {}, Joy: {})",
        turn.role, turn.content, turn.anger, turn.sadness, turn.joy
    )
}

fn render_hit(turn: &ConversationTurn) -> String {
    format!(
        "{} said '{}' to {} on {}",
        turn.character,
        turn.content,
        turn.user_id,
        turn.timestamp.format(TIMESTAMP_FORMAT)
    )
}

fn join(turns: &[ConversationTurn], render: fn(&ConversationTurn) -> String) -> String {
    turns.iter().map(render).collect::<Vec<_>>().join("; ")
}

/// Summary of the recent turns with one character.
#[must_use]
pub fn recent_summary(recent: &[ConversationTurn]) -> String {
    if recent.is_empty() {
        NO_HISTORY.to_string()
    } else {
        format!("{RECENT_PREFIX}{}", join(recent, render_recent))
    }
}

/// Recall sentence for `term`, citing at most `limit` hits.
#[must_use]
pub fn recall_summary(term: &str, hits: &[ConversationTurn], limit: usize) -> String {
    if hits.is_empty() {
        format!(" I don't recall anyone named '{term}' from past interactions.")
    } else {
        let cited = &hits[..hits.len().min(limit)];
        format!("{RECALL_PREFIX}{}", join(cited, render_hit))
    }
}

/// Build the memory context for one exchange.
///
/// Must be called *before* the current turn is appended to the log, so
/// the prompt only ever sees earlier conversation.
///
/// # Errors
///
/// Propagates store failures from [`ConversationLog`].
pub fn build_memory_context(
    log: &ConversationLog,
    user_id: &str,
    character: &str,
    prompt: &str,
    config: &MemoryConfig,
) -> Result<String> {
    let recent = log.recent_with(user_id, character, config.recent_turns)?;
    let mut context = recent_summary(&recent);

    if let Some(term) = search_term(prompt, &config.recall_trigger) {
        let hits = log.search(&term)?;
        debug!(term = %term, hits = hits.len(), "Recall search");
        context.push_str(&recall_summary(&term, &hits, config.recall_hits));
    }

    Ok(context)
}
