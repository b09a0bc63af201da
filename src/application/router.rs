//! # Input Router
//!
//! Classifies a line of REPL input: a slash command with its arguments, or a
//! message for the model.

/// A parsed slash command. Optional arguments are `None` when omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Clear,
    Model(Option<String>),
    System(Option<String>),
    Prompt(Option<String>),
    WorkDir(Option<String>),
    Auto(Option<String>),
    Pending,
    Execute,
    Exit,
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Empty,
    Command(Command),
    Message(String),
}

pub fn route(input: &str) -> Route {
    let msg = input.trim();
    if msg.is_empty() {
        return Route::Empty;
    }
    if !msg.starts_with('/') {
        return Route::Message(msg.to_string());
    }

    let (cmd, args) = match msg.find(char::is_whitespace) {
        Some(idx) => (&msg[..idx], msg[idx..].trim()),
        None => (msg, ""),
    };
    tracing::debug!(cmd, args, "Routing command");

    let arg = || (!args.is_empty()).then(|| args.to_string());
    let command = match cmd {
        "/help" => Command::Help,
        "/clear" => Command::Clear,
        "/model" => Command::Model(arg()),
        "/system" => Command::System(arg()),
        "/prompt" => Command::Prompt(arg()),
        "/workdir" => Command::WorkDir(arg()),
        "/auto" => Command::Auto(arg()),
        "/pending" => Command::Pending,
        "/execute" => Command::Execute,
        "/exit" | "/quit" => Command::Exit,
        other => Command::Unknown(other.to_string()),
    };
    Route::Command(command)
}

/// `on`/`off` and the usual synonyms.
pub fn parse_toggle(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
