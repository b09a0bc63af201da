//! # REPL
//!
//! Interactive loop: reads lines from stdin, runs slash commands, streams model
//! responses to the terminal. Ctrl+C aborts whatever interaction is in flight
//! and returns to the prompt.

use anyhow::{Context, Result};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;

use crate::application::router::{Route, route};
use crate::domain::error::StreamError;
use crate::domain::signal::{AbortHandle, AbortSignal, abort_channel};
use crate::interface::commands::{CommandContext, Flow, dispatch};
use crate::strings::{help, logs, messages};

/// Abort handle of the interaction currently running, if any.
type CurrentAbort = Arc<Mutex<Option<AbortHandle>>>;

pub struct Repl {
    ctx: CommandContext,
    current: CurrentAbort,
}

impl Repl {
    pub fn new(ctx: CommandContext) -> Self {
        Self {
            ctx,
            current: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn run(mut self) -> Result<()> {
        self.spawn_interrupt_listener();
        self.print_banner();

        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = LinesStream::new(stdin.lines());

        loop {
            self.ctx.console.fragment("\n> ")?;
            let Some(line) = lines.next().await else {
                break;
            };
            let line = line.context("Failed to read input")?;

            match route(&line) {
                Route::Empty => continue,
                Route::Command(command) => {
                    let mut signal = self.begin();
                    let flow = dispatch(&mut self.ctx, command, &mut signal).await;
                    self.end();
                    match flow {
                        Ok(Flow::Exit) => break,
                        Ok(Flow::Continue) => {}
                        Err(e) => self.ctx.console.say(&messages::error(&format!("{e:#}"))),
                    }
                }
                Route::Message(text) => {
                    let mut signal = self.begin();
                    self.send(&text, &mut signal).await;
                    self.end();
                }
            }
        }

        self.ctx.console.blank();
        self.ctx.console.say(messages::GOODBYE);
        Ok(())
    }

    fn print_banner(&self) {
        let console = &self.ctx.console;
        console.say(help::BANNER);
        console.say(&messages::current_model(self.ctx.session.model()));
        console.blank();
        console.say(help::COMMANDS);
        console.blank();
        console.say(help::INTRO);
    }

    /// Installs a fresh abort channel for the next interaction.
    fn begin(&self) -> AbortSignal {
        let (handle, signal) = abort_channel();
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        signal
    }

    fn end(&self) {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).take();
    }

    fn spawn_interrupt_listener(&self) {
        let current = self.current.clone();
        let console = self.ctx.console.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("{}", logs::ctrl_c_failed(&e.to_string()));
                    return;
                }
                let handle = current.lock().unwrap_or_else(|e| e.into_inner()).clone();
                match handle {
                    Some(handle) => {
                        tracing::info!("Interrupt received, aborting interaction");
                        handle.abort();
                        console.blank();
                        console.say(messages::INTERRUPTED);
                    }
                    None => {
                        let _ = console.fragment("\n> ");
                    }
                }
            }
        });
    }

    async fn send(&mut self, text: &str, signal: &mut AbortSignal) {
        let ctx = &mut self.ctx;
        let console = ctx.console.clone();
        console.blank();

        let result = ctx
            .session
            .send_message(text, signal, |fragment| console.fragment(fragment))
            .await;

        let turn = match result {
            Ok(turn) => turn,
            Err(e) if e.is_interruption() => {
                tracing::warn!(error = %e, "Response interrupted");
                console.blank();
                if let StreamError::Source(source) = &e {
                    console.say(&messages::error(&format!("{source:#}")));
                }
                console.say(messages::INTERRUPTED_TIP);
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "Response failed");
                console.blank();
                console.say(&messages::error(&format!("{e:#}")));
                return;
            }
        };

        console.blank();
        console.blank();
        if let Some(metrics) = &turn.response.metrics {
            console.metrics(
                metrics,
                ctx.model_params.as_ref(),
                ctx.session.conversation().len(),
                turn.response.text.chars().count(),
            );
        }

        if turn.actions.is_empty() {
            return;
        }
        console.blank();
        console.actions(&messages::detected_actions(turn.actions.len()), &turn.actions);
        console.blank();
        match &turn.report {
            Some(report) => {
                console.say(messages::AUTO_EXECUTED);
                console.report(report);
            }
            None => console.say(messages::EXECUTE_TIP),
        }
    }
}
