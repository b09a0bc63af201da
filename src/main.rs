//! # Main Entry Point
//!
//! Loads configuration, sets up logging and runs one of:
//! - `chat`: the interactive REPL (default)
//! - `extract`: list the actions found in a saved response
//! - `apply`: extract and execute the actions of a saved response

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use toolsmith::application::engine::ExecutionEngine;
use toolsmith::application::logging;
use toolsmith::application::parsing::extract;
use toolsmith::application::prompts::PromptLibrary;
use toolsmith::application::session::Session;
use toolsmith::application::validation::validate;
use toolsmith::domain::config::AppConfig;
use toolsmith::domain::signal::abort_channel;
use toolsmith::infrastructure::llm::OllamaClient;
use toolsmith::interface::commands::CommandContext;
use toolsmith::interface::commands::misc::expand_home;
use toolsmith::interface::console::{Console, ConsoleReporter};
use toolsmith::interface::repl::Repl;
use toolsmith::strings::{logs, messages};

#[derive(Debug, Parser)]
#[command(name = "toolsmith", version, about = "Coding agent REPL for Ollama")]
struct Cli {
    /// Configuration file (defaults to ./toolsmith.yaml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ollama base URL
    #[arg(long, global = true)]
    url: Option<String>,

    /// Model name
    #[arg(long, global = true)]
    model: Option<String>,

    /// Directory of *.txt system prompts
    #[arg(long, global = true)]
    prompts: Option<String>,

    /// System prompt name or text
    #[arg(long, global = true)]
    system: Option<String>,

    /// Working directory for actions
    #[arg(long, global = true)]
    workdir: Option<String>,

    /// Execute extracted actions without asking
    #[arg(long, global = true)]
    auto: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Interactive chat (default)
    Chat,
    /// Print the actions found in a saved response
    Extract { file: PathBuf },
    /// Extract and execute the actions of a saved response
    Apply { file: PathBuf },
}

impl Cli {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(url) = &self.url {
            config.ollama.url = url.clone();
        }
        if let Some(model) = &self.model {
            config.ollama.model = model.clone();
        }
        if let Some(dir) = &self.prompts {
            config.agent.prompts_dir = Some(dir.clone());
        }
        if let Some(system) = &self.system {
            config.agent.system_prompt = Some(system.clone());
        }
        if let Some(dir) = &self.workdir {
            config.agent.work_dir = Some(dir.clone());
        }
        if self.auto {
            config.agent.auto_execute = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::discover(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    let _guard = logging::init(&config.logging)?;
    tracing::info!("{}", logs::STARTING);
    tracing::info!(
        "{}",
        logs::config_loaded(
            &cli.config
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "defaults or discovered file".to_string())
        )
    );

    let result = match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => chat(&config).await,
        Commands::Extract { file } => extract_file(&file),
        Commands::Apply { file } => apply_file(&config, &file).await,
    };

    tracing::info!("{}", logs::SHUTDOWN);
    result
}

fn work_dir(config: &AppConfig) -> Result<PathBuf> {
    match &config.agent.work_dir {
        Some(dir) => Ok(expand_home(dir)),
        None => std::env::current_dir().context("Failed to determine current directory"),
    }
}

async fn chat(config: &AppConfig) -> Result<()> {
    let console = Console::stdout();
    let client = Arc::new(OllamaClient::new(&config.ollama)?);

    let prompts = match &config.agent.prompts_dir {
        Some(dir) => PromptLibrary::load_dir(&expand_home(dir)).unwrap_or_else(|e| {
            tracing::warn!("{}", logs::prompts_load_failed(dir, &format!("{e:#}")));
            PromptLibrary::default()
        }),
        None => PromptLibrary::default(),
    };

    let engine = ExecutionEngine::new(Arc::new(ConsoleReporter::new(console.clone())));
    let mut session = Session::new(client.clone(), engine, &config.ollama.model, work_dir(config)?);
    session.set_system_prompt(
        config
            .agent
            .system_prompt
            .as_deref()
            .map(|p| prompts.resolve(p).to_string()),
    );
    session.set_auto_execute(config.agent.auto_execute);

    let ctx = CommandContext {
        session,
        prompts,
        console,
        client: Some(client),
        model_params: None,
    };
    Repl::new(ctx).run().await
}

fn read_response(file: &Path) -> Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

fn extract_file(file: &Path) -> Result<()> {
    let console = Console::stdout();
    let actions = extract(&read_response(file)?);
    if actions.is_empty() {
        console.say(messages::NO_ACTIONS_FOUND);
        return Ok(());
    }

    console.say(&messages::detected_actions(actions.len()));
    for (i, action) in actions.iter().enumerate() {
        console.say(&messages::action_line(i + 1, &action.to_string()));
        if let Err(violation) = validate(action) {
            console.say(&messages::invalid_action(&violation.to_string()));
        }
    }
    Ok(())
}

async fn apply_file(config: &AppConfig, file: &Path) -> Result<()> {
    let console = Console::stdout();
    let actions = extract(&read_response(file)?);
    if actions.is_empty() {
        console.say(messages::NO_ACTIONS_FOUND);
        return Ok(());
    }

    let (handle, mut signal) = abort_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.abort();
        }
    });

    let engine = ExecutionEngine::new(Arc::new(ConsoleReporter::new(console.clone())));
    let report = engine.execute(&actions, &work_dir(config)?, &mut signal).await;
    console.blank();
    console.report(&report);
    report.into_result()?;
    Ok(())
}
