//! # Session
//!
//! One interactive conversation: streams a response for each user message,
//! keeps the history, extracts actions and either holds them as pending or
//! executes them straight away.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::engine::{ExecutionEngine, ExecutionReport};
use crate::application::parsing::extract;
use crate::application::state::{Conversation, PendingActions};
use crate::application::stream::reassemble;
use crate::domain::error::StreamError;
use crate::domain::signal::AbortSignal;
use crate::domain::traits::{CompletionRequest, LlmProvider};
use crate::domain::types::{AgentAction, Message, Reassembled};

/// Result of one user message.
#[derive(Debug)]
pub struct Turn {
    pub response: Reassembled,
    pub actions: Vec<AgentAction>,
    /// Present when the actions were executed automatically.
    pub report: Option<ExecutionReport>,
}

pub struct Session {
    provider: Arc<dyn LlmProvider>,
    engine: ExecutionEngine,
    model: String,
    system_prompt: Option<String>,
    conversation: Conversation,
    pending: PendingActions,
    auto_execute: bool,
    work_dir: PathBuf,
}

impl Session {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        engine: ExecutionEngine,
        model: impl Into<String>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            provider,
            engine,
            model: model.into(),
            system_prompt: None,
            conversation: Conversation::default(),
            pending: PendingActions::default(),
            auto_execute: false,
            work_dir: work_dir.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn set_system_prompt(&mut self, prompt: Option<String>) {
        self.system_prompt = prompt.filter(|p| !p.trim().is_empty());
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn set_work_dir(&mut self, dir: impl Into<PathBuf>) {
        self.work_dir = dir.into();
    }

    pub fn auto_execute(&self) -> bool {
        self.auto_execute
    }

    pub fn set_auto_execute(&mut self, enabled: bool) {
        self.auto_execute = enabled;
    }

    pub fn pending(&self) -> &PendingActions {
        &self.pending
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn clear_history(&mut self) {
        self.conversation.clear();
    }

    /// Sends `message`, forwarding response fragments to `on_fragment` as they
    /// arrive. On failure no assistant message is recorded and the pending
    /// actions are left as they were.
    pub async fn send_message<F>(
        &mut self,
        message: &str,
        abort: &mut AbortSignal,
        on_fragment: F,
    ) -> Result<Turn, StreamError>
    where
        F: FnMut(&str) -> anyhow::Result<()>,
    {
        self.conversation.push(Message::user(message));

        let request = CompletionRequest {
            model: self.model.clone(),
            system: self.system_prompt.clone(),
            prompt: self.conversation.flatten(self.system_prompt.as_deref()),
        };
        tracing::info!(
            model = %request.model,
            history = self.conversation.len(),
            "Sending message"
        );

        let chunks = self
            .provider
            .stream(&request)
            .await
            .map_err(StreamError::Source)?;
        let response = reassemble(chunks, abort, on_fragment).await?;

        self.conversation
            .push(Message::assistant(response.text.clone()));

        let actions = extract(&response.text);
        tracing::info!(
            chars = response.text.len(),
            actions = actions.len(),
            "Response complete"
        );
        if !actions.is_empty() {
            self.pending.replace(actions.clone());
        }

        let report = if self.auto_execute && !actions.is_empty() {
            self.pending.clear();
            Some(self.engine.execute(&actions, &self.work_dir, abort).await)
        } else {
            None
        };

        Ok(Turn {
            response,
            actions,
            report,
        })
    }

    /// Executes and clears the pending actions. `None` when nothing is pending.
    pub async fn execute_pending(&mut self, abort: &mut AbortSignal) -> Option<ExecutionReport> {
        if self.pending.is_empty() {
            return None;
        }
        let actions = self.pending.take();
        Some(self.engine.execute(&actions, &self.work_dir, abort).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::ChunkStream;
    use async_trait::async_trait;
    use futures::stream;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Replays canned chunks and remembers the last request.
    struct ScriptedProvider {
        chunks: Vec<String>,
        last_request: Mutex<Option<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn new(chunks: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                chunks: chunks.iter().map(|c| c.to_string()).collect(),
                last_request: Mutex::new(None),
            })
        }

        fn last_request(&self) -> CompletionRequest {
            self.last_request.lock().unwrap().clone().unwrap()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn stream(&self, request: &CompletionRequest) -> anyhow::Result<ChunkStream> {
            *self.last_request.lock().unwrap() = Some(request.clone());
            let items: Vec<anyhow::Result<String>> =
                self.chunks.iter().cloned().map(Ok).collect();
            Ok(Box::pin(stream::iter(items)))
        }
    }

    struct Unreachable;

    #[async_trait]
    impl LlmProvider for Unreachable {
        async fn stream(&self, _request: &CompletionRequest) -> anyhow::Result<ChunkStream> {
            anyhow::bail!("connection refused")
        }
    }

    const FILE_RESPONSE: &[&str] = &[
        r#"{"response":"Sure. <create_file><path>a.txt</path>"}"#,
        r#"{"response":"<content>hi</content></create_file>"}"#,
        r#"{"response":"","done":true}"#,
    ];

    fn session(provider: Arc<dyn LlmProvider>, dir: &Path) -> Session {
        Session::new(provider, ExecutionEngine::default(), "test-model", dir)
    }

    #[tokio::test]
    async fn test_send_message_holds_actions_pending() {
        let temp_dir = TempDir::new().unwrap();
        let provider = ScriptedProvider::new(FILE_RESPONSE);
        let mut session = session(provider.clone(), temp_dir.path());
        session.set_system_prompt(Some("Use tags.".into()));

        let mut streamed = String::new();
        let turn = session
            .send_message("make a.txt", &mut AbortSignal::never(), |f| {
                streamed.push_str(f);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(streamed, turn.response.text);
        assert_eq!(turn.actions.len(), 1);
        assert!(turn.report.is_none());
        assert_eq!(session.pending().len(), 1);
        assert_eq!(session.conversation().len(), 2);
        assert!(!temp_dir.path().join("a.txt").exists());

        let request = provider.last_request();
        assert_eq!(request.model, "test-model");
        assert_eq!(request.system.as_deref(), Some("Use tags."));
        assert_eq!(request.prompt, "System: Use tags.\n\nUser: make a.txt");

        let report = session
            .execute_pending(&mut AbortSignal::never())
            .await
            .unwrap();
        assert!(report.succeeded());
        assert!(session.pending().is_empty());
        assert_eq!(
            std::fs::read_to_string(temp_dir.path().join("a.txt")).unwrap(),
            "hi"
        );
    }

    #[tokio::test]
    async fn test_auto_execute_runs_and_clears() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = session(ScriptedProvider::new(FILE_RESPONSE), temp_dir.path());
        session.set_auto_execute(true);

        let turn = session
            .send_message("go", &mut AbortSignal::never(), |_| Ok(()))
            .await
            .unwrap();

        assert!(turn.report.unwrap().succeeded());
        assert!(session.pending().is_empty());
        assert!(temp_dir.path().join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_plain_reply_keeps_previous_pending() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = session(ScriptedProvider::new(FILE_RESPONSE), temp_dir.path());
        session
            .send_message("first", &mut AbortSignal::never(), |_| Ok(()))
            .await
            .unwrap();

        let provider: Arc<dyn LlmProvider> = ScriptedProvider::new(&["Nothing to do."]);
        session.provider = provider;
        let turn = session
            .send_message("second", &mut AbortSignal::never(), |_| Ok(()))
            .await
            .unwrap();

        assert!(turn.actions.is_empty());
        assert_eq!(session.pending().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_stream_adds_no_assistant_message() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = session(ScriptedProvider::new(FILE_RESPONSE), temp_dir.path());
        session
            .send_message("first", &mut AbortSignal::never(), |_| Ok(()))
            .await
            .unwrap();

        let provider: Arc<dyn LlmProvider> =
            ScriptedProvider::new(&[r#"{"response":"par"}"#, r#"{"error":"oom"}"#]);
        session.provider = provider;
        let err = session
            .send_message("second", &mut AbortSignal::never(), |_| Ok(()))
            .await
            .unwrap_err();

        assert!(matches!(err, StreamError::Protocol(_)));
        let roles: Vec<_> = session
            .conversation()
            .messages()
            .iter()
            .map(|m| m.role.as_str())
            .collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
        assert_eq!(session.pending().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_setup_failure_is_source_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = session(Arc::new(Unreachable), temp_dir.path());

        let err = session
            .send_message("hello", &mut AbortSignal::never(), |_| Ok(()))
            .await
            .unwrap_err();

        assert!(matches!(err, StreamError::Source(_)));
        assert!(session.pending().is_empty());
    }

    #[tokio::test]
    async fn test_execute_pending_when_empty() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = session(ScriptedProvider::new(&[]), temp_dir.path());
        assert!(session
            .execute_pending(&mut AbortSignal::never())
            .await
            .is_none());
    }
}
