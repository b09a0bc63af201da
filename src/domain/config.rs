//! # Configuration
//!
//! Manages the loading and parsing of the application's configuration file (`toolsmith.yaml`).
//! Defines the structs for the backend connection, agent behaviour and logging.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "toolsmith.yaml";

/// Main application configuration structure.
#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection settings for the generation backend.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OllamaConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Seconds to wait for the connection to be established. The response
    /// stream itself is bounded only by the abort signal.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            model: default_model(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

fn default_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "qwen3-coder:30b".to_string()
}

fn default_connect_timeout() -> u64 {
    30
}

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub struct AgentConfig {
    /// Directory of `*.txt` system prompts, addressable by file stem.
    #[serde(default)]
    pub prompts_dir: Option<String>,
    /// Prompt name or literal system prompt text.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Root for all actions. Defaults to the process working directory.
    #[serde(default)]
    pub work_dir: Option<String>,
    #[serde(default)]
    pub auto_execute: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub directory: String,
    #[serde(default = "default_log_file")]
    pub file: String,
    /// Used when `RUST_LOG` is not set.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Mirror logs to stderr.
    #[serde(default)]
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_dir(),
            file: default_log_file(),
            filter: default_filter(),
            console: false,
        }
    }
}

fn default_log_dir() -> String {
    "data".to_string()
}

fn default_log_file() -> String {
    "session.log".to_string()
}

fn default_filter() -> String {
    "info,hyper=warn,reqwest=warn".to_string()
}

impl AppConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse YAML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Loads the explicit path if given, otherwise the first config file found in
    /// the current directory or the user config directory, otherwise defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::candidate_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("toolsmith").join("config.yaml"));
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = AppConfig::from_yaml("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.ollama.url, "http://localhost:11434");
        assert!(!config.agent.auto_execute);
        assert_eq!(config.logging.file, "session.log");
    }

    #[test]
    fn test_partial_sections() {
        let yaml = r#"
ollama:
  model: llama3
agent:
  auto_execute: true
  work_dir: /tmp/sandbox
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.ollama.model, "llama3");
        assert_eq!(config.ollama.url, "http://localhost:11434");
        assert!(config.agent.auto_execute);
        assert_eq!(config.agent.work_dir.as_deref(), Some("/tmp/sandbox"));
        assert_eq!(config.logging.directory, "data");
    }

    #[test]
    fn test_load_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.yaml");
        std::fs::write(&path, "logging:\n  console: true\n").unwrap();

        let config = AppConfig::discover(Some(&path)).unwrap();
        assert!(config.logging.console);
    }

    #[test]
    fn test_missing_explicit_path_fails() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.yaml");
        assert!(AppConfig::discover(Some(&missing)).is_err());
    }
}
