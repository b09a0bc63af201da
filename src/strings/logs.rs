//! # Log Messages
//!
//! Text for tracing events emitted by the binary.

pub const STARTING: &str = "Starting toolsmith";
pub const SHUTDOWN: &str = "Shutting down";

pub fn config_loaded(source: &str) -> String {
    format!("Loaded configuration from {source}")
}

pub fn prompts_load_failed(dir: &str, err: &str) -> String {
    format!("Failed to load prompts from {dir}: {err}")
}

pub fn ctrl_c_failed(err: &str) -> String {
    format!("Unable to listen for Ctrl+C: {err}")
}
