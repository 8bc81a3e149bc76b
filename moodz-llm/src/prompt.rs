//! Prompt templates for MOODZ LLM operations.
//!
//! Two prompts exist. [`EXTRACTION_SYSTEM`] / [`EXTRACTION_USER`] ask the
//! model to list a document's characters as `Name: Description` lines;
//! [`character_system_prompt`] builds the per-turn persona, and
//! [`character_system_prompt_with`] the same under a prompting technique.

use moodz_core::Register;

use crate::technique::PromptTechnique;

/// Literary-analyst persona for character extraction.
pub const EXTRACTION_SYSTEM: &str = "You are an expert literary analyst.";

/// Character extraction request. `{text}` is the (truncated) document.
pub const EXTRACTION_USER: &str = r#"Given the following fictional text, identify the major characters and infer their speaking styles based on their dialogue, actions, and descriptions. For each character, provide a name and a concise description of their speaking style (e.g., "Harry Potter: Curious, brave, and straightforward"). Return the result as a list of "Name: Description" pairs. Here's the text:

{text}"#;

/// Opening of every character persona.
pub const CHARACTER_SYSTEM: &str = "You are {character} from the uploaded fiction. {style} ";

/// Simple template interpolation for prompts.
///
/// Replaces `{key}` with the corresponding value. Unknown placeholders are
/// left as they are.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

/// Keep at most the first `max_chars` characters of `text`.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

/// `(system, user)` prompts for extracting characters from `text`.
#[must_use]
pub fn extraction_prompts(text: &str, max_chars: usize) -> (String, String) {
    let chunk = truncate_chars(text, max_chars);
    (
        EXTRACTION_SYSTEM.to_string(),
        render_template(EXTRACTION_USER, &[("text", chunk)]),
    )
}

/// System prompt for one turn: persona, style, register instruction (if
/// any), then the memory context.
#[must_use]
pub fn character_system_prompt(
    character: &str,
    style: &str,
    register: Register,
    memory_context: &str,
) -> String {
    character_system_prompt_with(
        character,
        style,
        register,
        PromptTechnique::ZeroShot,
        memory_context,
    )
}

/// [`character_system_prompt`] under a prompting technique. The
/// technique's sentence follows the persona and precedes the register
/// instruction.
#[must_use]
pub fn character_system_prompt_with(
    character: &str,
    style: &str,
    register: Register,
    technique: PromptTechnique,
    memory_context: &str,
) -> String {
    let mut prompt =
        render_template(CHARACTER_SYSTEM, &[("character", character), ("style", style)]);
    for sentence in [technique.system_suffix(), register.instruction()]
        .into_iter()
        .flatten()
    {
        prompt.push_str(sentence);
        prompt.push(' ');
    }
    prompt.push_str(memory_context);
    prompt
}
