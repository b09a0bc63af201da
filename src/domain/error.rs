//! # Errors
//!
//! Typed failures for the streaming, validation and execution stages.

use std::path::PathBuf;
use thiserror::Error;

/// Why a streamed response could not be reassembled.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The backend sent an explicit error chunk.
    #[error("stream error: {0}")]
    Protocol(String),
    /// The interaction was aborted while waiting for the next chunk.
    #[error("stream cancelled")]
    Cancelled,
    /// The chunk source itself failed (transport, decoding).
    #[error("error reading stream: {0}")]
    Source(#[source] anyhow::Error),
    /// The fragment callback refused a fragment.
    #[error(transparent)]
    Sink(anyhow::Error),
}

impl StreamError {
    /// Cancellation and source failures are not the backend's fault; the
    /// caller can offer to continue.
    pub fn is_interruption(&self) -> bool {
        matches!(self, StreamError::Cancelled | StreamError::Source(_))
    }
}

/// A structural problem found before an action runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("path cannot be empty")]
    EmptyPath,
    #[error("path cannot contain '..': {0}")]
    PathTraversal(String),
    #[error("path must be relative: {0}")]
    AbsolutePath(String),
    #[error("command cannot be empty")]
    EmptyCommand,
    #[error("search string cannot be empty")]
    EmptySearch,
}

/// Why a single action failed.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("validation failed: {0}")]
    Validation(#[from] Violation),
    #[error("path escapes working directory: {}", .0.display())]
    OutsideWorkDir(PathBuf),
    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("search string not found in file {}", .0.display())]
    SearchNotFound(PathBuf),
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("command failed: {0}")]
    CommandFailed(String),
    #[error("cancelled")]
    Cancelled,
    #[error("not started: interaction was cancelled")]
    NotStarted,
}

impl ActionError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ActionError::Validation(_))
    }
}
