//! # Messages
//!
//! Constant strings and format functions for everything printed to the terminal.

use std::path::Path;

pub const GOODBYE: &str = "Goodbye!";
pub const HISTORY_CLEARED: &str = "✓ Conversation history cleared";
pub const NO_SYSTEM_PROMPT: &str = "No system prompt set";
pub const SYSTEM_UPDATED: &str = "✓ System prompt updated";
pub const SYSTEM_USAGE: &str =
    "Usage: /system <name|message>  (a loaded prompt name selects that prompt)";
pub const MODEL_USAGE: &str = "Usage: /model <model-name>";
pub const PROMPT_USAGE: &str = "Usage: /prompt <name>";
pub const NO_PROMPTS: &str = "No saved prompts loaded";
pub const WORKDIR_USAGE: &str = "Usage: /workdir <directory>";
pub const AUTO_USAGE: &str = "Usage: /auto <on|off>";
pub const AUTO_ENABLED: &str = "✓ Auto-execution enabled";
pub const AUTO_DISABLED: &str = "✓ Auto-execution disabled";
pub const NO_PENDING: &str = "No pending actions to execute";
pub const EXECUTING_PENDING: &str = "⚙️  Executing pending actions...";
pub const AUTO_EXECUTED: &str = "⚙️  Actions were executed automatically:";
pub const ALL_COMPLETED: &str = "✅ All actions completed successfully";
pub const EXECUTION_CANCELLED: &str = "🛑 Execution cancelled; remaining actions were not started";
pub const EXECUTE_TIP: &str =
    "💡 Tip: Use /execute to run these actions, or enable auto-execution with /auto on";
pub const INTERRUPTED: &str = "🛑 Interrupted!";
pub const INTERRUPTED_TIP: &str =
    "💡 Tip: The response was interrupted. Continue with your next question!";
pub const NO_ACTIONS_FOUND: &str = "No actions found";
pub const COMPLETED: &str = "  ✓ Completed";

pub fn current_model(model: &str) -> String {
    format!("Current model: {model}")
}

pub fn model_switched(model: &str) -> String {
    format!("✓ Switched to model: {model}")
}

pub fn model_details_unavailable(model: &str, err: &str) -> String {
    format!("✓ Switched to model: {model} (could not fetch details: {err})")
}

pub fn current_system_prompt(prompt: &str) -> String {
    format!("Current system prompt:\n{prompt}")
}

pub fn prompt_loaded(name: &str) -> String {
    format!("✓ Loaded system prompt: {name}")
}

pub fn prompt_not_found(name: &str) -> String {
    format!("prompt '{name}' not found")
}

pub fn current_workdir(dir: &Path) -> String {
    format!("Current working directory: {}", dir.display())
}

pub fn workdir_set(dir: &Path) -> String {
    format!("✓ Working directory set to: {}", dir.display())
}

pub fn workdir_missing(dir: &Path) -> String {
    format!("directory does not exist: {}", dir.display())
}

pub fn auto_status(enabled: bool) -> String {
    let status = if enabled { "enabled" } else { "disabled" };
    format!("Auto-execution is currently: {status}")
}

pub fn invalid_toggle(value: &str) -> String {
    format!("invalid value: {value} (use 'on' or 'off')")
}

pub fn unknown_command(cmd: &str) -> String {
    format!("unknown command: {cmd} (type /help for available commands)")
}

pub fn error(err: &str) -> String {
    format!("Error: {err}")
}

pub fn detected_actions(count: usize) -> String {
    format!("📋 Detected {count} action(s):")
}

pub fn pending_actions(count: usize) -> String {
    format!("📋 {count} pending action(s):")
}

pub fn action_line(position: usize, description: &str) -> String {
    format!("  {position}. {description}")
}

pub fn action_progress(index: usize, total: usize, description: &str) -> String {
    format!("[{index}/{total}] {description}")
}

pub fn action_failed(err: &str) -> String {
    format!("  ✖ {err}")
}

pub fn command_output(line: &str) -> String {
    format!("  │ {line}")
}

pub fn file_banner(path: &str) -> String {
    format!("=== Content of {path} ===")
}

pub const FILE_BANNER_END: &str = "=== End ===";

pub fn batch_started(time: &str, total: usize) -> String {
    format!("Ran {total} action(s), started at {time}")
}

pub fn completed_with_failures(failed: usize, total: usize) -> String {
    format!("⚠️  Completed with {failed} failure(s) out of {total} action(s):")
}

pub fn failure_line(index: usize, description: &str, err: &str) -> String {
    format!("  #{index} {description}: {err}")
}

pub fn invalid_action(err: &str) -> String {
    format!("     ⚠ would be rejected: {err}")
}

pub const MODEL_STATS: &str = "📊 Model Stats:";
pub const MODEL_INFO: &str = "🤖 Model Information:";
pub const MODEL_PARAMETERS: &str = "⚙️  Model Parameters:";

pub fn stat_line(label: &str, value: impl std::fmt::Display) -> String {
    format!("  • {label}: {value}")
}

pub fn context_usage(used: usize, capacity: u64) -> String {
    let percent = used as f64 / capacity as f64 * 100.0;
    format!("{used}/{capacity} tokens ({percent:.1}%)")
}
