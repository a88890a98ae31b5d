//! EngLingo application binary - composition root.
//!
//! 1. Parse CLI args and load configuration from TOML
//! 2. Apply environment and flag overrides
//! 3. Build the completion client and the orchestrator
//! 4. Run the line-based tutor REPL on stdin/stdout

mod cli;
mod command;
mod persist;
mod render;

use std::path::Path;

use clap::Parser;
use englingo_chat::{ChatError, CompletionClient, Orchestrator, SubmitOutcome};
use englingo_core::config::SharedAiConfig;
use englingo_core::EnglingoConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use cli::CliArgs;
use command::{Command, HELP};
use persist::Transcript;

const CONFIG_HINT: &str =
    "Hint: set OPENROUTER_API_KEY, pass --api-key, or add `api_key` under [ai] in the config file.";

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Print a failed exchange; configuration problems get a hint.
fn report_error(err: &ChatError) {
    println!("! {err}");
    if err.is_configuration() {
        println!("{CONFIG_HINT}");
    }
}

fn print_outcome(orchestrator: &Orchestrator, outcome: &SubmitOutcome) {
    let log = orchestrator.log();
    if let Some(turn) = outcome.user_turn.and_then(|id| log.get(id)) {
        println!("{}", render::render_turn(&turn));
    }
    if let Some(turn) = log.get(outcome.assistant_turn) {
        println!("{}", render::render_turn(&turn));
    }
}

async fn export(orchestrator: &Orchestrator, path: &Path) {
    orchestrator.wait_for_analyses().await;
    match orchestrator.log().save_json(path) {
        Ok(()) => println!("Transcript written to {}", path.display()),
        Err(e) => println!("! export failed: {e}"),
    }
}

async fn run_repl(
    orchestrator: &Orchestrator,
    client: &CompletionClient,
    config_path: &Path,
) -> std::io::Result<()> {
    println!("EngLingo v{}. Type /help for commands.", env!("CARGO_PKG_VERSION"));
    let current = orchestrator.log().context_window(None);
    if !current.is_empty() {
        println!("{}", render::render_topic(&current));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Empty => {}
            Command::Submit(text) => match orchestrator.submit(&text, false).await {
                Ok(outcome) => print_outcome(orchestrator, &outcome),
                Err(e) => report_error(&e),
            },
            Command::NewTopic => {
                let id = orchestrator.new_topic();
                if let Some(divider) = orchestrator.log().get(id) {
                    println!("{}", render::render_turn(&divider));
                }
            }
            Command::Continue => match orchestrator.continue_topic().await {
                Ok(Some(outcome)) => print_outcome(orchestrator, &outcome),
                Ok(None) => println!("(nothing to continue, say something first)"),
                Err(e) => report_error(&e),
            },
            Command::Models => match client.list_models().await {
                Ok(models) if models.is_empty() => println!("(no matching models)"),
                Ok(models) => {
                    let active = client.config().snapshot().model;
                    for model in models {
                        let marker = if model == active { "*" } else { " " };
                        println!("{marker} {model}");
                    }
                }
                Err(e) => report_error(&e),
            },
            Command::Persona(None) => println!("Persona: {}", orchestrator.persona()),
            Command::Persona(Some(persona)) => {
                orchestrator.set_persona(persona.as_str());
                match persist::save_persona(config_path, &persona) {
                    Ok(()) => println!("Persona updated."),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to save persona");
                        println!("! persona applied for this session but not saved: {e}");
                        println!("  Fix {} to make it permanent.", config_path.display());
                    }
                }
            }
            Command::Analysis => {
                let topic = orchestrator.log().context_window(None);
                println!("{}", render::render_topic(&topic));
                let pending = orchestrator.pending_analyses();
                if pending > 0 {
                    println!("({pending} analyses still running)");
                }
            }
            Command::Export(path) => export(orchestrator, &path).await,
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
            Command::Invalid(msg) => println!("! {msg}"),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config, read before tracing so the file's log level applies.
    let config_path = args.resolve_config_path();
    let loaded = EnglingoConfig::load(&config_path);
    let mut config = loaded.as_ref().cloned().unwrap_or_default();

    // Tracing.
    init_tracing(args.resolve_log_level(&config.general.log_level).as_deref());
    tracing::info!("Starting EngLingo v{}", env!("CARGO_PKG_VERSION"));
    match &loaded {
        Ok(_) => tracing::info!(path = %config_path.display(), "Configuration loaded"),
        Err(e) if config_path.exists() => {
            tracing::warn!(path = %config_path.display(), error = %e, "Invalid config, using defaults")
        }
        Err(_) => tracing::info!(path = %config_path.display(), "No config file, using defaults"),
    }

    config.apply_env_overrides();
    args.apply_overrides(&mut config);

    if args.save_config {
        config.save(&config_path)?;
        println!("Configuration saved to {}", config_path.display());
        return Ok(());
    }

    if !config.ai.has_credential() {
        println!("No API key configured. {CONFIG_HINT}");
    }

    // Engines.
    let shared = SharedAiConfig::new(config.ai.clone());
    let client = CompletionClient::new(shared);
    let transcript = match persist::open_transcript(args.transcript.as_deref()) {
        Ok(transcript) => transcript,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load transcript");
            if let Some(path) = &args.transcript {
                println!("! could not read transcript {}: {e}", path.display());
                println!("  It will be left untouched and this session will not be saved.");
            }
            Transcript::unsaved()
        }
    };
    let orchestrator = Orchestrator::from_client(client.clone(), config.tutor.persona.clone())
        .with_log(transcript.log);
    tracing::info!(model = %config.ai.model, base_url = %config.ai.base_url, "Tutor ready");

    run_repl(&orchestrator, &client, &config_path).await?;

    if let Some(path) = &transcript.save_to {
        export(&orchestrator, path).await;
    }
    Ok(())
}
