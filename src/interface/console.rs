//! # Console
//!
//! Terminal output: streamed model text, action progress and summaries.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::application::engine::ExecutionReport;
use crate::domain::traits::ActionReporter;
use crate::domain::types::{ActionOutcome, AgentAction, OutputStream, ResponseMetrics};
use crate::infrastructure::llm::ModelParameters;
use crate::strings::messages;

type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Cloneable handle to the output; clones share one writer.
#[derive(Clone)]
pub struct Console {
    out: Sink,
}

impl Console {
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            out: Arc::new(Mutex::new(writer)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        self.out.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Writes one line. Terminal write errors are not worth failing over.
    pub fn say(&self, text: &str) {
        let mut out = self.lock();
        let _ = writeln!(out, "{text}");
        let _ = out.flush();
    }

    pub fn blank(&self) {
        self.say("");
    }

    /// Writes a streamed fragment without a newline. Errors propagate so the
    /// stream stops when the terminal is gone.
    pub fn fragment(&self, text: &str) -> anyhow::Result<()> {
        let mut out = self.lock();
        out.write_all(text.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    pub fn actions(&self, header: &str, actions: &[AgentAction]) {
        self.say(header);
        for (i, action) in actions.iter().enumerate() {
            self.say(&messages::action_line(i + 1, &action.to_string()));
        }
    }

    pub fn report(&self, report: &ExecutionReport) {
        let started = report.started_at.format("%H:%M:%S").to_string();
        self.say(&messages::batch_started(&started, report.outcomes.len()));
        if report.cancelled {
            self.say(messages::EXECUTION_CANCELLED);
        }
        if report.succeeded() {
            self.say(messages::ALL_COMPLETED);
            return;
        }

        self.say(&messages::completed_with_failures(
            report.failure_count(),
            report.outcomes.len(),
        ));
        for outcome in report.failures() {
            let err = outcome
                .error()
                .map(ToString::to_string)
                .unwrap_or_default();
            self.say(&messages::failure_line(
                outcome.index,
                &outcome.action.to_string(),
                &err,
            ));
        }
    }

    /// Per-response statistics. Durations arrive in nanoseconds.
    pub fn metrics(
        &self,
        metrics: &ResponseMetrics,
        params: Option<&ModelParameters>,
        history: usize,
        response_chars: usize,
    ) {
        let capacity = params.and_then(|p| p.context_length).filter(|c| *c > 0);

        self.say(messages::MODEL_STATS);
        if let Some(capacity) = capacity {
            self.say(&messages::stat_line("Model Context", format!("{capacity} tokens")));
        }
        self.say(&messages::stat_line("Context Messages", history));
        self.say(&messages::stat_line(
            "Response Length",
            format!("{response_chars} chars"),
        ));
        if let Some(total) = metrics.total_duration {
            self.say(&messages::stat_line("Total Duration", format!("{}ms", total / 1_000_000)));
        }
        if let Some(load) = metrics.load_duration {
            self.say(&messages::stat_line("Load Duration", format!("{}ms", load / 1_000_000)));
        }
        if let (Some(count), Some(duration)) = (metrics.eval_count, metrics.eval_duration)
            && duration > 0
        {
            let rate = count as f64 / (duration as f64 / 1e9);
            self.say(&messages::stat_line("Generation", format!("{count} tokens ({rate:.1} tok/s)")));
        }
        match (metrics.context_tokens, capacity) {
            (Some(used), Some(capacity)) => self.say(&messages::stat_line(
                "Context Usage",
                messages::context_usage(used, capacity),
            )),
            (Some(used), None) => self.say(&messages::stat_line("Context Tokens Used", used)),
            (None, _) => {}
        }
    }
}

/// Prints progress of a running batch.
pub struct ConsoleReporter {
    console: Console,
}

impl ConsoleReporter {
    pub fn new(console: Console) -> Self {
        Self { console }
    }
}

impl ActionReporter for ConsoleReporter {
    fn action_started(&self, index: usize, total: usize, action: &AgentAction) {
        self.console
            .say(&messages::action_progress(index, total, &action.to_string()));
    }

    fn command_output(&self, _stream: OutputStream, line: &str) {
        self.console.say(&messages::command_output(line));
    }

    fn action_finished(&self, outcome: &ActionOutcome) {
        match (&outcome.action, &outcome.result) {
            (AgentAction::ReadFile { path }, Ok(content)) => {
                self.console.say(&messages::file_banner(path));
                self.console.say(content.as_deref().unwrap_or_default());
                self.console.say(messages::FILE_BANNER_END);
            }
            (_, Ok(_)) => self.console.say(messages::COMPLETED),
            (_, Err(e)) => self.console.say(&messages::action_failed(&e.to_string())),
        }
    }
}

/// In-memory writer for asserting on console output.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl Captured {
    pub fn console() -> (Console, Self) {
        let captured = Self::default();
        (Console::new(Box::new(captured.clone())), captured)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

#[cfg(test)]
impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
