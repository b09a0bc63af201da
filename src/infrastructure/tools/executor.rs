//! # Tool Executor
//!
//! Handles execution of commands and filesystem operations on behalf of actions.
//! Every path is resolved beneath a single working-directory root.

use std::path::{Component, Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::domain::error::ActionError;
use crate::domain::signal::AbortSignal;
use crate::domain::traits::ActionReporter;
use crate::domain::types::OutputStream;

/// Executes tools (process, fs) scoped to one root directory.
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    root: PathBuf,
}

impl ToolExecutor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Joins a relative path onto the root, refusing anything that would land
    /// outside it. Purely lexical: symlinks are not followed.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, ActionError> {
        let mut resolved = self.root.clone();
        let mut depth = 0usize;
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir if depth > 0 => {
                    resolved.pop();
                    depth -= 1;
                }
                _ => return Err(ActionError::OutsideWorkDir(PathBuf::from(relative))),
            }
        }
        Ok(resolved)
    }

    pub async fn write_file(&self, path: &str, content: &str) -> Result<(), ActionError> {
        let full_path = self.resolve(path)?;
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ActionError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&full_path, content)
            .await
            .map_err(|source| ActionError::Write {
                path: full_path,
                source,
            })
    }

    pub async fn create_dir(&self, path: &str) -> Result<(), ActionError> {
        let full_path = self.resolve(path)?;
        tokio::fs::create_dir_all(&full_path)
            .await
            .map_err(|source| ActionError::CreateDir {
                path: full_path,
                source,
            })
    }

    pub async fn read_file(&self, path: &str) -> Result<String, ActionError> {
        let full_path = self.resolve(path)?;
        tokio::fs::read_to_string(&full_path)
            .await
            .map_err(|source| ActionError::Read {
                path: full_path,
                source,
            })
    }

    /// Replaces the first occurrence of `search`. The file is left untouched when
    /// `search` does not occur.
    pub async fn modify_file(&self, path: &str, search: &str, replace: &str) -> Result<(), ActionError> {
        let full_path = self.resolve(path)?;
        let content = tokio::fs::read_to_string(&full_path)
            .await
            .map_err(|source| ActionError::Read {
                path: full_path.clone(),
                source,
            })?;

        if !content.contains(search) {
            return Err(ActionError::SearchNotFound(full_path));
        }
        let updated = content.replacen(search, replace, 1);

        tokio::fs::write(&full_path, updated)
            .await
            .map_err(|source| ActionError::Write {
                path: full_path,
                source,
            })
    }

    /// Runs a command without a shell: the text is split on whitespace into a
    /// program and its arguments. Output lines are forwarded to `reporter` as they
    /// arrive and returned together once the process exits successfully.
    pub async fn execute_command(
        &self,
        command: &str,
        reporter: &dyn ActionReporter,
        abort: &mut AbortSignal,
    ) -> Result<String, ActionError> {
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| ActionError::CommandFailed("empty command".to_string()))?;

        let mut cmd = Command::new(program);
        cmd.args(parts)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| ActionError::Spawn {
            program: program.to_string(),
            source,
        })?;
        tracing::debug!(program, pid = ?child.id(), "Spawned command");

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(ActionError::CommandFailed("output pipes unavailable".to_string()));
        };

        let run = async {
            let mut out = BufReader::new(stdout);
            let mut err = BufReader::new(stderr);
            // read_until keeps partial lines in these buffers across select! rounds.
            let (mut out_buf, mut err_buf) = (Vec::new(), Vec::new());
            let (mut out_open, mut err_open) = (true, true);
            let mut captured = String::new();

            while out_open || err_open {
                tokio::select! {
                    read = out.read_until(b'\n', &mut out_buf), if out_open => {
                        if read? == 0 {
                            out_open = false;
                        }
                        forward(reporter, OutputStream::Stdout, &mut out_buf, &mut captured);
                    }
                    read = err.read_until(b'\n', &mut err_buf), if err_open => {
                        if read? == 0 {
                            err_open = false;
                        }
                        forward(reporter, OutputStream::Stderr, &mut err_buf, &mut captured);
                    }
                }
            }

            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, captured))
        };

        let finished = tokio::select! {
            res = run => Some(res),
            _ = abort.aborted() => None,
        };

        match finished {
            None => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(error = %e, "Failed to kill cancelled command");
                }
                Err(ActionError::Cancelled)
            }
            Some(Err(e)) => Err(ActionError::CommandFailed(e.to_string())),
            Some(Ok((status, _))) if !status.success() => {
                Err(ActionError::CommandFailed(status.to_string()))
            }
            Some(Ok((_, captured))) => Ok(captured),
        }
    }
}

/// Emits a buffered line (if any) and clears the buffer.
fn forward(reporter: &dyn ActionReporter, stream: OutputStream, buf: &mut Vec<u8>, captured: &mut String) {
    if buf.is_empty() {
        return;
    }
    let text = String::from_utf8_lossy(buf);
    let line = text.trim_end_matches(['\n', '\r']);
    reporter.command_output(stream, line);
    if stream == OutputStream::Stdout {
        captured.push_str(line);
        captured.push('\n');
    }
    buf.clear();
}
