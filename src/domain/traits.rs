//! # Domain Traits
//!
//! Abstract interfaces for core system components (LLM transport, action progress).
//! Allows for pluggable implementations in the Infrastructure and Interface layers.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::domain::types::{ActionOutcome, AgentAction, OutputStream};

/// Raw chunks as delivered by a transport, one line per item.
pub type ChunkStream = Pin<Box<dyn Stream<Item = anyhow::Result<String>> + Send>>;

/// A single generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: Option<String>,
    pub prompt: String,
}

/// Abstract interface for an LLM Provider
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Start a streamed generation. Errors here are transport setup failures;
    /// failures after the first chunk arrive through the stream.
    async fn stream(&self, request: &CompletionRequest) -> anyhow::Result<ChunkStream>;
}

/// Receives progress while a batch of actions runs.
pub trait ActionReporter: Send + Sync {
    fn action_started(&self, _index: usize, _total: usize, _action: &AgentAction) {}

    /// A line printed by a running command, delivered as it arrives.
    fn command_output(&self, _stream: OutputStream, _line: &str) {}

    fn action_finished(&self, _outcome: &ActionOutcome) {}
}

/// Reporter that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl ActionReporter for SilentReporter {}
