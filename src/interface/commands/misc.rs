//! # Session Commands
//!
//! Handles `/clear`, `/model`, `/system`, `/prompt`, `/workdir` and `/auto`.
//! Without an argument each command shows the current setting.

use anyhow::{Result, bail};
use std::path::PathBuf;

use crate::application::router::parse_toggle;
use crate::infrastructure::llm::ModelParameters;
use crate::infrastructure::llm::types::ShowModelResponse;
use crate::interface::commands::CommandContext;
use crate::interface::console::Console;
use crate::strings::messages;

pub fn handle_clear(ctx: &mut CommandContext) -> Result<()> {
    ctx.session.clear_history();
    ctx.console.say(messages::HISTORY_CLEARED);
    Ok(())
}

pub async fn handle_model(ctx: &mut CommandContext, name: Option<&str>) -> Result<()> {
    let Some(name) = name else {
        ctx.console.say(&messages::current_model(ctx.session.model()));
        ctx.console.say(messages::MODEL_USAGE);
        return Ok(());
    };

    ctx.session.set_model(name);
    ctx.model_params = None;
    tracing::info!(model = name, "Switched model");

    let Some(client) = ctx.client.clone() else {
        ctx.console.say(&messages::model_switched(name));
        return Ok(());
    };

    match client.show_model(name).await {
        Ok(info) => {
            let params = ModelParameters::parse(&info.parameters);
            print_model_info(&ctx.console, name, &info, &params);
            ctx.model_params = Some(params);
            ctx.console.say(&messages::model_switched(name));
        }
        Err(e) => {
            tracing::warn!(model = name, error = %e, "Could not fetch model details");
            ctx.console
                .say(&messages::model_details_unavailable(name, &format!("{e:#}")));
        }
    }
    Ok(())
}

fn print_model_info(console: &Console, name: &str, info: &ShowModelResponse, params: &ModelParameters) {
    console.blank();
    console.say(messages::MODEL_INFO);
    console.say(&messages::stat_line("Name", name));
    let details = [
        ("License", &info.license),
        ("Format", &info.details.format),
        ("Family", &info.details.family),
        ("Size", &info.details.parameter_size),
        ("Quantization", &info.details.quantization_level),
    ];
    for (label, value) in details {
        if !value.is_empty() {
            console.say(&messages::stat_line(label, value.lines().next().unwrap_or_default()));
        }
    }

    if params.is_empty() {
        return;
    }
    console.blank();
    console.say(messages::MODEL_PARAMETERS);
    if let Some(n) = params.context_length {
        console.say(&messages::stat_line("Context Window", format!("{n} tokens")));
    }
    if let Some(n) = params.embedding_length {
        console.say(&messages::stat_line("Embedding Size", n));
    }
    if let Some(n) = params.gpu_layers {
        console.say(&messages::stat_line("GPU Layers", n));
    }
    if let Some(template) = &params.template {
        console.say(&messages::stat_line("Template", template));
    }
}

pub fn handle_system(ctx: &mut CommandContext, text: Option<&str>) -> Result<()> {
    let Some(text) = text else {
        match ctx.session.system_prompt() {
            Some(prompt) => ctx.console.say(&messages::current_system_prompt(prompt)),
            None => ctx.console.say(messages::NO_SYSTEM_PROMPT),
        }
        ctx.console.say(messages::SYSTEM_USAGE);
        return Ok(());
    };

    if let Some(prompt) = ctx.prompts.get(text) {
        ctx.session.set_system_prompt(Some(prompt.to_string()));
        ctx.console.say(&messages::prompt_loaded(text));
    } else {
        ctx.session.set_system_prompt(Some(text.to_string()));
        ctx.console.say(messages::SYSTEM_UPDATED);
    }
    Ok(())
}

pub fn handle_prompt(ctx: &mut CommandContext, name: Option<&str>) -> Result<()> {
    let Some(name) = name else {
        if ctx.prompts.is_empty() {
            ctx.console.say(messages::NO_PROMPTS);
        } else {
            ctx.console.say("Available prompts:");
            for name in ctx.prompts.names() {
                ctx.console.say(&format!("  - {name}"));
            }
        }
        ctx.console.say(messages::PROMPT_USAGE);
        return Ok(());
    };

    let Some(prompt) = ctx.prompts.get(name) else {
        bail!(messages::prompt_not_found(name));
    };
    ctx.session.set_system_prompt(Some(prompt.to_string()));
    ctx.console.say(&messages::prompt_loaded(name));
    Ok(())
}

pub fn handle_workdir(ctx: &mut CommandContext, dir: Option<&str>) -> Result<()> {
    let Some(dir) = dir else {
        ctx.console
            .say(&messages::current_workdir(ctx.session.work_dir()));
        ctx.console.say(messages::WORKDIR_USAGE);
        return Ok(());
    };

    let dir = expand_home(dir);
    if !dir.is_dir() {
        bail!(messages::workdir_missing(&dir));
    }
    tracing::info!(work_dir = %dir.display(), "Working directory changed");
    ctx.console.say(&messages::workdir_set(&dir));
    ctx.session.set_work_dir(dir);
    Ok(())
}

/// Expands a leading `~` to the home directory.
pub fn expand_home(dir: &str) -> PathBuf {
    if let Some(rest) = dir.strip_prefix('~')
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest.trim_start_matches(['/', '\\']));
    }
    PathBuf::from(dir)
}

pub fn handle_auto(ctx: &mut CommandContext, value: Option<&str>) -> Result<()> {
    let Some(value) = value else {
        ctx.console
            .say(&messages::auto_status(ctx.session.auto_execute()));
        ctx.console.say(messages::AUTO_USAGE);
        return Ok(());
    };

    let Some(enabled) = parse_toggle(value) else {
        bail!(messages::invalid_toggle(value));
    };
    ctx.session.set_auto_execute(enabled);
    ctx.console.say(if enabled {
        messages::AUTO_ENABLED
    } else {
        messages::AUTO_DISABLED
    });
    Ok(())
}
