//! # Command Handlers
//!
//! One handler per slash command. `dispatch` is called by the REPL with the
//! command already parsed by the router.

pub mod actions;
pub mod help;
pub mod misc;

use anyhow::{Result, bail};
use std::sync::Arc;

use crate::application::prompts::PromptLibrary;
use crate::application::router::Command;
use crate::application::session::Session;
use crate::domain::signal::AbortSignal;
use crate::infrastructure::llm::{ModelParameters, OllamaClient};
use crate::interface::console::Console;
use crate::strings::messages;

/// Everything a command may read or change.
pub struct CommandContext {
    pub session: Session,
    pub prompts: PromptLibrary,
    pub console: Console,
    /// Used to look up model details on `/model`; absent offline.
    pub client: Option<Arc<OllamaClient>>,
    pub model_params: Option<ModelParameters>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub async fn dispatch(
    ctx: &mut CommandContext,
    command: Command,
    abort: &mut AbortSignal,
) -> Result<Flow> {
    match command {
        Command::Help => help::handle_help(&ctx.console)?,
        Command::Clear => misc::handle_clear(ctx)?,
        Command::Model(name) => misc::handle_model(ctx, name.as_deref()).await?,
        Command::System(text) => misc::handle_system(ctx, text.as_deref())?,
        Command::Prompt(name) => misc::handle_prompt(ctx, name.as_deref())?,
        Command::WorkDir(dir) => misc::handle_workdir(ctx, dir.as_deref())?,
        Command::Auto(value) => misc::handle_auto(ctx, value.as_deref())?,
        Command::Pending => actions::handle_pending(ctx)?,
        Command::Execute => actions::handle_execute(ctx, abort).await?,
        Command::Exit => return Ok(Flow::Exit),
        Command::Unknown(cmd) => bail!(messages::unknown_command(&cmd)),
    }
    Ok(Flow::Continue)
}
