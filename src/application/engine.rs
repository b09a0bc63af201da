//! # Execution Engine
//!
//! Applies an ordered batch of actions against a working directory.
//! Actions run strictly one after another; a failing action is recorded and the
//! batch moves on. Only cancellation stops the batch early.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::application::validation::validate;
use crate::domain::error::ActionError;
use crate::domain::signal::AbortSignal;
use crate::domain::traits::{ActionReporter, SilentReporter};
use crate::domain::types::{ActionOutcome, AgentAction};
use crate::infrastructure::tools::executor::ToolExecutor;

/// Outcome of a whole batch, one entry per action in input order.
#[derive(Debug)]
pub struct ExecutionReport {
    pub started_at: DateTime<Local>,
    pub outcomes: Vec<ActionOutcome>,
    /// The batch was aborted; actions after the cancelled one were not started.
    pub cancelled: bool,
}

impl ExecutionReport {
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(ActionOutcome::is_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ActionOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// "All succeeded" or "failed with N failures".
    pub fn into_result(self) -> Result<Vec<ActionOutcome>, ExecutionFailed> {
        if self.succeeded() {
            return Ok(self.outcomes);
        }
        let (failed, succeeded): (Vec<_>, Vec<_>) =
            self.outcomes.into_iter().partition(|o| !o.is_success());
        Err(ExecutionFailed {
            failed,
            succeeded,
            cancelled: self.cancelled,
        })
    }
}

/// Aggregate failure of a batch; every failed action is kept.
#[derive(Debug, Error)]
#[error("completed with {} failure(s)", .failed.len())]
pub struct ExecutionFailed {
    pub failed: Vec<ActionOutcome>,
    pub succeeded: Vec<ActionOutcome>,
    pub cancelled: bool,
}

#[derive(Clone)]
pub struct ExecutionEngine {
    reporter: Arc<dyn ActionReporter>,
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new(Arc::new(SilentReporter))
    }
}

impl ExecutionEngine {
    pub fn new(reporter: Arc<dyn ActionReporter>) -> Self {
        Self { reporter }
    }

    /// Validates and applies each action in order under `work_dir`.
    pub async fn execute(
        &self,
        actions: &[AgentAction],
        work_dir: &Path,
        abort: &mut AbortSignal,
    ) -> ExecutionReport {
        let started_at = Local::now();
        let tools = ToolExecutor::new(work_dir);
        let total = actions.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut cancelled = false;

        tracing::info!(total, work_dir = %work_dir.display(), "Executing actions");

        for (i, action) in actions.iter().enumerate() {
            let index = i + 1;

            if cancelled || abort.is_aborted() {
                cancelled = true;
                outcomes.push(ActionOutcome {
                    index,
                    action: action.clone(),
                    result: Err(ActionError::NotStarted),
                });
                continue;
            }

            self.reporter.action_started(index, total, action);

            let result = match validate(action) {
                Err(violation) => Err(ActionError::from(violation)),
                Ok(()) => self.apply(&tools, action, abort).await,
            };

            match &result {
                Ok(_) => tracing::info!(index, action = %action, "Action completed"),
                Err(ActionError::Cancelled) => {
                    tracing::warn!(index, action = %action, "Action cancelled");
                    cancelled = true;
                }
                Err(e) => tracing::warn!(index, action = %action, error = %e, "Action failed"),
            }

            let outcome = ActionOutcome {
                index,
                action: action.clone(),
                result,
            };
            self.reporter.action_finished(&outcome);
            outcomes.push(outcome);
        }

        let report = ExecutionReport {
            started_at,
            outcomes,
            cancelled,
        };
        tracing::info!(
            total,
            failed = report.failure_count(),
            cancelled = report.cancelled,
            "Finished executing actions"
        );
        report
    }

    async fn apply(
        &self,
        tools: &ToolExecutor,
        action: &AgentAction,
        abort: &mut AbortSignal,
    ) -> Result<Option<String>, ActionError> {
        match action {
            AgentAction::CreateFile { path, content } => {
                tools.write_file(path, content).await.map(|_| None)
            }
            AgentAction::CreateDirectory { path } => tools.create_dir(path).await.map(|_| None),
            AgentAction::ExecuteCommand { command, .. } => tools
                .execute_command(command, self.reporter.as_ref(), abort)
                .await
                .map(Some),
            AgentAction::ModifyFile {
                path,
                search,
                replace,
            } => tools.modify_file(path, search, replace).await.map(|_| None),
            AgentAction::ReadFile { path } => tools.read_file(path).await.map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::parsing::extract;
    use crate::domain::signal::abort_channel;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct EventLog {
        events: Mutex<Vec<String>>,
    }

    impl ActionReporter for EventLog {
        fn action_started(&self, index: usize, total: usize, action: &AgentAction) {
            self.events
                .lock()
                .unwrap()
                .push(format!("start {index}/{total} {}", action.kind()));
        }

        fn action_finished(&self, outcome: &ActionOutcome) {
            let status = if outcome.is_success() { "ok" } else { "err" };
            self.events
                .lock()
                .unwrap()
                .push(format!("finish {} {status}", outcome.index));
        }
    }

    fn create_file(path: &str, content: &str) -> AgentAction {
        AgentAction::CreateFile {
            path: path.into(),
            content: content.into(),
        }
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_batch() {
        let temp_dir = TempDir::new().unwrap();
        let engine = ExecutionEngine::default();
        let actions = vec![
            create_file("one.txt", "1"),
            AgentAction::ModifyFile {
                path: "missing.txt".into(),
                search: "a".into(),
                replace: "b".into(),
            },
            create_file("three.txt", "3"),
        ];

        let report = engine
            .execute(&actions, temp_dir.path(), &mut AbortSignal::never())
            .await;

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.failure_count(), 1);
        let failed: Vec<_> = report.failures().map(|o| o.index).collect();
        assert_eq!(failed, vec![2]);
        assert!(report.outcomes[0].is_success());
        assert!(report.outcomes[2].is_success());
        assert!(temp_dir.path().join("three.txt").exists());

        let err = report.into_result().unwrap_err();
        assert_eq!(err.to_string(), "completed with 1 failure(s)");
        assert_eq!(err.failed[0].index, 2);
        assert_eq!(err.succeeded.len(), 2);
    }

    #[tokio::test]
    async fn test_validation_failure_recorded() {
        let temp_dir = TempDir::new().unwrap();
        let engine = ExecutionEngine::default();
        let actions = vec![
            create_file("../outside.txt", "nope"),
            create_file("inside.txt", "yes"),
        ];

        let report = engine
            .execute(&actions, temp_dir.path(), &mut AbortSignal::never())
            .await;

        assert!(report.outcomes[0].error().unwrap().is_validation());
        assert!(report.outcomes[1].is_success());
        assert!(!temp_dir.path().parent().unwrap().join("outside.txt").exists());
    }

    #[tokio::test]
    async fn test_create_then_modify_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let engine = ExecutionEngine::default();
        let actions = vec![
            create_file("app.cfg", "mode=dev\nbackup_mode=dev\n"),
            AgentAction::ModifyFile {
                path: "app.cfg".into(),
                search: "dev".into(),
                replace: "prod".into(),
            },
            AgentAction::ReadFile {
                path: "app.cfg".into(),
            },
        ];

        let report = engine
            .execute(&actions, temp_dir.path(), &mut AbortSignal::never())
            .await;

        assert!(report.succeeded());
        assert_eq!(
            report.outcomes[2].output(),
            Some("mode=prod\nbackup_mode=dev\n")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_extract_and_execute_example() {
        let temp_dir = TempDir::new().unwrap();
        let events = Arc::new(EventLog::default());
        let engine = ExecutionEngine::new(events.clone());
        let response = "<create_file><path>main.txt</path><content>hello</content></create_file>\n\
                        <execute_command><command>echo done</command></execute_command>";

        let actions = extract(response);
        assert_eq!(actions.len(), 2);

        let report = engine
            .execute(&actions, temp_dir.path(), &mut AbortSignal::never())
            .await;

        assert!(report.succeeded());
        assert_eq!(
            std::fs::read_to_string(temp_dir.path().join("main.txt")).unwrap(),
            "hello"
        );
        assert_eq!(report.outcomes[1].output(), Some("done\n"));
        assert_eq!(
            *events.events.lock().unwrap(),
            vec![
                "start 1/2 create_file",
                "finish 1 ok",
                "start 2/2 execute_command",
                "finish 2 ok",
            ]
        );
    }

    #[tokio::test]
    async fn test_aborted_before_start() {
        let temp_dir = TempDir::new().unwrap();
        let events = Arc::new(EventLog::default());
        let engine = ExecutionEngine::new(events.clone());
        let (handle, mut signal) = abort_channel();
        handle.abort();

        let report = engine
            .execute(&[create_file("a.txt", "a")], temp_dir.path(), &mut signal)
            .await;

        assert!(report.cancelled);
        assert!(matches!(
            report.outcomes[0].error(),
            Some(ActionError::NotStarted)
        ));
        assert!(!temp_dir.path().join("a.txt").exists());
        assert!(events.events.lock().unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_during_command_skips_rest() {
        let temp_dir = TempDir::new().unwrap();
        let engine = ExecutionEngine::default();
        let (handle, mut signal) = abort_channel();
        let actions = vec![
            AgentAction::ExecuteCommand {
                command: "sleep 10".into(),
                description: None,
            },
            create_file("after.txt", "x"),
        ];

        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            handle.abort();
        });

        let report = engine.execute(&actions, temp_dir.path(), &mut signal).await;

        assert!(report.cancelled);
        assert!(matches!(report.outcomes[0].error(), Some(ActionError::Cancelled)));
        assert!(matches!(report.outcomes[1].error(), Some(ActionError::NotStarted)));
        assert!(!temp_dir.path().join("after.txt").exists());
    }

    #[tokio::test]
    async fn test_empty_batch_succeeds() {
        let temp_dir = TempDir::new().unwrap();
        let report = ExecutionEngine::default()
            .execute(&[], temp_dir.path(), &mut AbortSignal::never())
            .await;
        assert!(report.succeeded());
        assert!(report.into_result().unwrap().is_empty());
    }
}
