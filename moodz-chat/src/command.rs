//! Terminal input lines → commands.

use std::path::PathBuf;

use moodz_llm::{PromptTechnique, ResponseLength, ResponseStyle};

/// Help text printed by `/help`.
pub const HELP: &str = "\
/upload <file>        load a .pdf or .txt and extract its characters
/characters           list the extracted characters
/as <name>            talk to <name> from now on
/set key=value ...    queue slider values (1-7) for the next message
/mood                 show the current mood sliders
/technique <name>     zero_shot, chain_of_thought, self_reflection,
                      deliberate_structure, multi_turn_refinement
/style <name>         very_dynamic (1.0), balanced (0.7), realistic (0.3),
                      historical_accuracy (0.2)
/length <name>        concise (50), balanced (150), in_depth (300 tokens)
/settings             show technique, style and length
/history              show your stored conversation
/help                 this text
/quit                 leave
anything else         say it to the current character";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load a document.
    Upload(PathBuf),
    /// List the roster.
    Characters,
    /// Select the active character.
    Select(String),
    /// Queue slider values for the next exchange.
    Set(Vec<(String, i64)>),
    /// Print the mood.
    Mood,
    /// Switch prompting technique.
    Technique(PromptTechnique),
    /// Switch temperature preset.
    Style(ResponseStyle),
    /// Switch token-cap preset.
    Length(ResponseLength),
    /// Print the generation settings.
    Settings,
    /// Print the stored history.
    History,
    /// Print help.
    Help,
    /// Exit.
    Quit,
    /// Plain chat text.
    Say(String),
    /// Blank line.
    Nothing,
}

/// Parse one line.
///
/// # Errors
/// A human-readable message for malformed commands.
pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Nothing);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Say(line.to_string()));
    };

    let (verb, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let arg = arg.trim();
    match verb {
        "upload" if !arg.is_empty() => Ok(Command::Upload(PathBuf::from(arg))),
        "upload" => Err("usage: /upload <file>".to_string()),
        "characters" | "chars" => Ok(Command::Characters),
        "as" if !arg.is_empty() => Ok(Command::Select(arg.to_string())),
        "as" => Err("usage: /as <name>".to_string()),
        "set" => parse_assignments(arg).map(Command::Set),
        "mood" => Ok(Command::Mood),
        "technique" => preset(arg, "/technique <name>").map(Command::Technique),
        "style" => preset(arg, "/style <name>").map(Command::Style),
        "length" => preset(arg, "/length <name>").map(Command::Length),
        "settings" => Ok(Command::Settings),
        "history" => Ok(Command::History),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command '/{other}' (try /help)")),
    }
}

fn preset<T>(arg: &str, usage: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if arg.is_empty() {
        return Err(format!("usage: {usage}"));
    }
    arg.parse().map_err(|e: T::Err| e.to_string())
}

fn parse_assignments(arg: &str) -> Result<Vec<(String, i64)>, String> {
    if arg.is_empty() {
        return Err("usage: /set key=value ...".to_string());
    }
    arg.split_whitespace()
        .map(|pair| {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected key=value, got '{pair}'"))?;
            let value = value
                .parse::<i64>()
                .map_err(|_| format!("'{value}' is not an integer"))?;
            Ok((key.to_string(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_said() {
        assert_eq!(parse("  Hello, Holmes  "), Ok(Command::Say("Hello, Holmes".into())));
        assert_eq!(parse("   "), Ok(Command::Nothing));
    }

    #[test]
    fn select_keeps_spaces_in_names() {
        assert_eq!(parse("/as Sherlock Holmes"), Ok(Command::Select("Sherlock Holmes".into())));
        assert!(parse("/as").is_err());
    }

    #[test]
    fn set_parses_pairs() {
        assert_eq!(
            parse("/set valence=2 arousal=6"),
            Ok(Command::Set(vec![("valence".into(), 2), ("arousal".into(), 6)]))
        );
        assert!(parse("/set valence").is_err());
        assert!(parse("/set valence=high").is_err());
    }

    #[test]
    fn upload_needs_a_path() {
        assert_eq!(parse("/upload story.txt"), Ok(Command::Upload("story.txt".into())));
        assert!(parse("/upload").is_err());
    }

    #[test]
    fn presets_accept_keys_and_labels() {
        assert_eq!(
            parse("/technique chain_of_thought"),
            Ok(Command::Technique(PromptTechnique::ChainOfThought))
        );
        assert_eq!(
            parse("/technique Self-reflection"),
            Ok(Command::Technique(PromptTechnique::SelfReflection))
        );
        assert_eq!(
            parse("/style Historical Accuracy"),
            Ok(Command::Style(ResponseStyle::HistoricalAccuracy))
        );
        assert_eq!(parse("/length in-depth"), Ok(Command::Length(ResponseLength::InDepth)));
        assert_eq!(parse("/settings"), Ok(Command::Settings));
    }

    #[test]
    fn bad_preset_is_reported() {
        assert_eq!(parse("/style"), Err("usage: /style <name>".to_string()));
        assert!(parse("/length epic").expect_err("unknown").contains("'epic'"));
    }

    #[test]
    fn unknown_command_is_reported() {
        assert!(parse("/dance").expect_err("unknown").contains("/dance"));
    }
}
