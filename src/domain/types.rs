//! # Domain Types
//!
//! Common data structures and enums used across the application logic.

use crate::domain::error::ActionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A side effect requested by the model through action markup.
///
/// Paths are expected to be relative to the working directory; that is checked by
/// `application::validation`, not here, so an invalid action can exist as data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentAction {
    CreateFile {
        path: String,
        content: String,
    },
    CreateDirectory {
        path: String,
    },
    ExecuteCommand {
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    ModifyFile {
        path: String,
        search: String,
        replace: String,
    },
    ReadFile {
        path: String,
    },
}

impl AgentAction {
    /// The path this action touches, if it has one.
    pub fn path(&self) -> Option<&str> {
        match self {
            AgentAction::CreateFile { path, .. }
            | AgentAction::CreateDirectory { path }
            | AgentAction::ModifyFile { path, .. }
            | AgentAction::ReadFile { path } => Some(path),
            AgentAction::ExecuteCommand { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AgentAction::CreateFile { .. } => "create_file",
            AgentAction::CreateDirectory { .. } => "create_directory",
            AgentAction::ExecuteCommand { .. } => "execute_command",
            AgentAction::ModifyFile { .. } => "modify_file",
            AgentAction::ReadFile { .. } => "read_file",
        }
    }
}

impl fmt::Display for AgentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentAction::CreateFile { path, content } => {
                write!(f, "CREATE_FILE: {} ({} bytes)", path, content.len())
            }
            AgentAction::CreateDirectory { path } => write!(f, "CREATE_DIRECTORY: {path}"),
            AgentAction::ExecuteCommand {
                command,
                description,
            } => write!(
                f,
                "EXECUTE_COMMAND: {} ({})",
                command,
                description.as_deref().unwrap_or("no description")
            ),
            AgentAction::ModifyFile { path, .. } => write!(f, "MODIFY_FILE: {path}"),
            AgentAction::ReadFile { path } => write!(f, "READ_FILE: {path}"),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    /// Capitalised label used when a conversation is flattened into one prompt.
    pub fn label(&self) -> &str {
        match self {
            MessageRole::System => "System",
            MessageRole::User => "User",
            MessageRole::Assistant => "Assistant",
        }
    }
}

/// A chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Counters the backend attaches to its terminal chunk. Durations are nanoseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetrics {
    pub total_duration: Option<u64>,
    pub load_duration: Option<u64>,
    pub prompt_eval_count: Option<u64>,
    pub prompt_eval_duration: Option<u64>,
    pub eval_count: Option<u64>,
    pub eval_duration: Option<u64>,
    /// Number of context tokens the backend reported back.
    pub context_tokens: Option<usize>,
}

impl ResponseMetrics {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The full text of one streamed response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reassembled {
    pub text: String,
    pub metrics: Option<ResponseMetrics>,
}

/// Which pipe a line of subprocess output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Result of one action in a batch. `index` is 1-based, in document order.
#[derive(Debug)]
pub struct ActionOutcome {
    pub index: usize,
    pub action: AgentAction,
    /// `Ok` carries whatever the action produced for display (file content,
    /// captured command output).
    pub result: Result<Option<String>, ActionError>,
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error(&self) -> Option<&ActionError> {
        self.result.as_ref().err()
    }

    pub fn output(&self) -> Option<&str> {
        self.result.as_ref().ok().and_then(|o| o.as_deref())
    }
}
