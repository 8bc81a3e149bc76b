//! Terminal front end for MOODZ.
//!
//! ```text
//! GROQ_API_KEY=... moodz-chat --config moodz.toml --user ada --document study.txt
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use moodz_chat::command::{self, Command};
use moodz_chat::{ChatService, ChatSession, document};
use moodz_core::{MoodUpdate, MoodzConfig};
use moodz_llm::LlmClient;

#[derive(Parser)]
#[command(name = "moodz-chat")]
#[command(version)]
#[command(about = "Chat with characters from your own fiction; their mood shapes every reply")]
struct Cli {
    /// TOML configuration file (defaults apply when omitted).
    #[arg(short, long, env = "MOODZ_CONFIG")]
    config: Option<PathBuf>,

    /// Whose conversation this is.
    #[arg(short, long, env = "MOODZ_USER", default_value = moodz_chat::session::ANONYMOUS)]
    user: String,

    /// Upload this document before the prompt appears.
    #[arg(short, long)]
    document: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8, configured: &str) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured)),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

async fn upload(
    service: &ChatService<LlmClient>,
    session: &mut ChatSession,
    path: &Path,
) -> anyhow::Result<()> {
    let Some(media_type) = document::media_type_for_path(path) else {
        bail!("{}: only .pdf and .txt files are supported", path.display());
    };
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let roster = service.upload(session, &bytes, media_type).await?;
    if roster.is_empty() {
        println!("No characters found in {}.", path.display());
    } else {
        println!("Characters in {}:", path.display());
        for c in roster.iter() {
            println!("  {}: {}", c.name, c.style);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => MoodzConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => MoodzConfig::default(),
    };
    init_tracing(cli.verbose, &config.general.log_level);
    config.validate()?;

    let client = LlmClient::from_config(&config.llm)?;
    let reject_unknown = config.mood.reject_unknown_keys;
    let service = ChatService::open(config, client)?;
    let mut session = ChatSession::new(cli.user);
    info!(session = %session.id, user = %session.user_id, "Session started");

    if let Some(path) = &cli.document {
        upload(&service, &mut session, path).await?;
    }

    println!("Type /help for commands.");
    let mut active: Option<String> = None;
    let mut pending = MoodUpdate::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command = match command::parse(&line) {
            Ok(command) => command,
            Err(msg) => {
                eprintln!("{msg}");
                continue;
            }
        };

        match command {
            Command::Nothing => {}
            Command::Quit => break,
            Command::Help => println!("{}", command::HELP),
            Command::Upload(path) => {
                if let Err(e) = upload(&service, &mut session, &path).await {
                    eprintln!("upload failed: {e:#}");
                }
            }
            Command::Characters => {
                for name in session.roster.names() {
                    println!("  {name}");
                }
            }
            Command::Select(name) => {
                if session.roster.contains(&name) {
                    println!("Now talking to {name}.");
                    active = Some(name);
                } else {
                    eprintln!("'{name}' is not in the roster (see /characters)");
                }
            }
            Command::Set(pairs) => match MoodUpdate::from_pairs(pairs, reject_unknown) {
                Ok(update) => {
                    pending = pending.merged(&update);
                    println!("Queued {} slider value(s) for the next message.", update.len());
                }
                Err(e) => eprintln!("{e}"),
            },
            Command::Technique(technique) => {
                session.settings.technique = technique;
                println!("Technique: {technique} ({})", technique.strategy());
            }
            Command::Style(style) => {
                session.settings.style = Some(style);
                println!("Style: {style}");
            }
            Command::Length(length) => {
                session.settings.length = Some(length);
                println!("Length: {length}");
            }
            Command::Settings => println!("{}", session.settings),
            Command::Mood => {
                for (param, value) in session.mood.iter() {
                    println!("  {:<20} {value}", param.label());
                }
            }
            Command::History => match service.log().history(&session.user_id) {
                Ok(turns) => {
                    for t in turns {
                        println!("[{}] {} / {}: {}", t.timestamp, t.character, t.role, t.content);
                    }
                }
                Err(e) => eprintln!("{e}"),
            },
            Command::Say(text) => {
                let Some(character) = active.as_deref() else {
                    eprintln!("Pick a character first with /as <name>.");
                    continue;
                };
                match service.exchange(&mut session, character, &text, &pending).await {
                    Ok(reply) => {
                        pending = MoodUpdate::new();
                        println!(
                            "{character} [{}; {}; {}]",
                            reply.register, reply.intensities, reply.settings
                        );
                        println!("{}", reply.response);
                    }
                    Err(e) => eprintln!("{e}"),
                }
            }
        }
    }

    Ok(())
}
