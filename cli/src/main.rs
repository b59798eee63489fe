//! `folio`: command-line client for the portfolio site.
//!
//! Talks to a running server for health, content and text chat, and runs a
//! live voice session directly against the hosted audio model using the
//! local microphone and speaker.

mod chat;
mod devices;
mod mixer;

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use voice::live::{DEFAULT_LIVE_MODEL, DEFAULT_VOICE};
use voice::{GeminiLiveConnector, LiveSetup, SessionConfig, SessionUpdate, VoiceSession};

use crate::chat::HttpResponder;
use crate::devices::{CpalMicrophone, CpalSpeaker};

#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("missing API key; pass --api-key or set GEMINI_API_KEY")]
    MissingApiKey,
    #[error("unknown section `{0}`")]
    UnknownSection(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned HTTP {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("terminal i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Voice(#[from] voice::VoiceError),
}

#[derive(Parser, Debug)]
#[command(name = "folio", about = "Portfolio site API, chat and voice CLI")]
struct Cli {
    #[arg(long, env = "FOLIO_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the server health endpoint.
    Ping,
    /// Print site content as JSON.
    Content(ContentCommand),
    /// Text chat with the assistant through the server.
    Chat(ChatCommand),
    /// Live voice conversation with the assistant.
    Voice(VoiceCommand),
}

#[derive(Args, Debug)]
struct ContentCommand {
    /// Read the bundled catalog instead of asking the server.
    #[arg(long)]
    offline: bool,

    #[command(subcommand)]
    command: Option<ContentSubcommand>,
}

#[derive(Subcommand, Debug)]
enum ContentSubcommand {
    /// One named section (`projects`, `courses`, ...).
    Section { name: String },
    Project { id: u32 },
    Course { id: u32 },
    Post { id: u32 },
}

#[derive(Args, Debug)]
struct ChatCommand {
    /// Send one message and exit instead of starting a conversation.
    #[arg(long)]
    message: Option<String>,
}

#[derive(Args, Debug)]
struct VoiceCommand {
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "LIVE_MODEL", default_value = DEFAULT_LIVE_MODEL)]
    live_model: String,

    #[arg(long, env = "LIVE_VOICE", default_value = DEFAULT_VOICE)]
    voice: String,

    /// Have the assistant open with the scripted greeting.
    #[arg(long)]
    greeting: bool,
}

#[derive(Debug, Clone)]
struct CliContext {
    base_url: String,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = CliContext { base_url: cli.base_url.trim_end_matches('/').to_owned() };

    match cli.command {
        Command::Ping => run_ping(&ctx).await,
        Command::Content(cmd) => run_content(&ctx, cmd).await,
        Command::Chat(cmd) => run_chat(&ctx, cmd).await,
        Command::Voice(cmd) => run_voice(cmd).await,
    }
}

async fn run_ping(cli: &CliContext) -> Result<(), CliError> {
    let client = reqwest::Client::new();
    let response = client.get(format!("{}/healthz", cli.base_url)).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::ServerError { status: status.as_u16(), message: "health check failed".to_owned() });
    }
    println!("ok");
    Ok(())
}

async fn run_content(cli: &CliContext, cmd: ContentCommand) -> Result<(), CliError> {
    if cmd.offline {
        return print_json(&offline_content(cmd.command.as_ref())?);
    }
    let path = match &cmd.command {
        None => "/api/content".to_owned(),
        Some(ContentSubcommand::Section { name }) => format!("/api/content/{name}"),
        Some(ContentSubcommand::Project { id }) => format!("/api/projects/{id}"),
        Some(ContentSubcommand::Course { id }) => format!("/api/courses/{id}"),
        Some(ContentSubcommand::Post { id }) => format!("/api/posts/{id}"),
    };
    let value = api_get(cli, &path).await?;
    print_json(&value)
}

fn offline_content(cmd: Option<&ContentSubcommand>) -> Result<Value, CliError> {
    let catalog = content::catalog();
    let value = match cmd {
        None => Some(serde_json::to_value(catalog)?),
        Some(ContentSubcommand::Section { name }) => {
            return catalog.section(name).ok_or_else(|| CliError::UnknownSection(name.clone()));
        }
        Some(ContentSubcommand::Project { id }) => catalog.project(*id).map(serde_json::to_value).transpose()?,
        Some(ContentSubcommand::Course { id }) => catalog.course(*id).map(serde_json::to_value).transpose()?,
        Some(ContentSubcommand::Post { id }) => catalog.post(*id).map(serde_json::to_value).transpose()?,
    };
    Ok(value.unwrap_or(Value::Null))
}

async fn run_chat(cli: &CliContext, cmd: ChatCommand) -> Result<(), CliError> {
    let responder = HttpResponder::new(&cli.base_url);
    match cmd.message {
        Some(message) => chat::run_once(&responder, &message).await,
        None => chat::run_repl(&responder).await,
    }
}

async fn run_voice(cmd: VoiceCommand) -> Result<(), CliError> {
    let api_key = cmd.api_key.filter(|key| !key.trim().is_empty()).ok_or(CliError::MissingApiKey)?;

    let catalog = content::catalog();
    let mut setup = LiveSetup::new(content::preamble::voice_instruction(&catalog));
    setup.model = cmd.live_model;
    setup.voice = cmd.voice;
    let greeting = cmd.greeting.then(|| content::preamble::voice_greeting(&catalog));

    let (mut session, mut updates) = VoiceSession::new(
        SessionConfig { setup, greeting },
        Arc::new(GeminiLiveConnector::new(api_key)),
        Box::new(CpalMicrophone::new()),
        Box::new(CpalSpeaker::new()),
    );

    let printer = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            print_update(&update);
        }
    });

    let stop = session.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.stop();
        }
    });

    let result = match session.connect().await {
        Ok(()) => {
            eprintln!("Listening. Press Ctrl-C to hang up.");
            session.run().await
        }
        Err(e) => Err(e),
    };
    drop(session);
    let _ = printer.await;
    result.map_err(CliError::from)
}

fn print_update(update: &SessionUpdate) {
    match update {
        SessionUpdate::State(state) => eprintln!("[{state:?}]"),
        SessionUpdate::Message(message) => {
            let who = if message.is_user { "you" } else { "assistant" };
            println!("{who}: {}", message.text);
        }
        SessionUpdate::Error(error) => eprintln!("error: {error}"),
    }
}

async fn api_get(cli: &CliContext, path: &str) -> Result<Value, CliError> {
    let client = reqwest::Client::new();
    let response = client.get(format!("{}{}", cli.base_url, path)).send().await?;
    let status = response.status();
    let value = response.json::<Value>().await.unwrap_or(Value::Null);

    if !status.is_success() {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| value.to_string(), str::to_owned);
        return Err(CliError::ServerError { status: status.as_u16(), message });
    }

    Ok(value)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
