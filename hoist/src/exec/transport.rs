//! Process transport

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::errors::AgentError;
use crate::exec::target::Target;

/// How a command's output is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Collect stdout and stderr
    Capture,

    /// Echo stdout live while collecting it
    Stream,

    /// Hand the terminal to the command
    Interactive,
}

/// A single command dispatched to a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub target: Target,
    pub command: String,
    pub mode: OutputMode,

    /// Local file fed to the command's stdin
    pub stdin_file: Option<PathBuf>,
}

impl Invocation {
    pub fn new(target: Target, command: impl Into<String>, mode: OutputMode) -> Self {
        Self {
            target,
            command: command.into(),
            mode,
            stdin_file: None,
        }
    }

    pub fn with_stdin_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdin_file = Some(path.into());
        self
    }
}

/// Result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Turn a non-zero exit into `AgentError::CommandFailed`
    pub fn check(self, command: &str) -> Result<Self, AgentError> {
        if self.success() {
            Ok(self)
        } else {
            Err(AgentError::CommandFailed {
                command: command.to_string(),
                status: self.status,
                stderr: self.stderr,
            })
        }
    }
}

/// Runs invocations; the seam between the workflows and real processes
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, invocation: &Invocation) -> Result<CommandOutput, AgentError>;
}

/// Transport backed by `bash` locally and `ssh` remotely
#[derive(Debug, Clone, Default)]
pub struct SystemTransport;

impl SystemTransport {
    pub fn new() -> Self {
        Self
    }

    fn command(&self, invocation: &Invocation) -> Result<Command, AgentError> {
        let mut command = match &invocation.target {
            Target::Local => {
                let mut command = Command::new("bash");
                command.arg("-c").arg(&invocation.command);
                command
            }
            Target::Remote(ssh) => {
                // a tty would swallow a script streamed on stdin
                let tty = match invocation.mode {
                    OutputMode::Interactive => true,
                    _ if invocation.stdin_file.is_some() => false,
                    _ => ssh.needs_tty,
                };
                let mut command = Command::new("ssh");
                command.args(ssh.args(tty)).arg(&invocation.command);
                command
            }
        };

        match (&invocation.stdin_file, invocation.mode) {
            (Some(path), _) => {
                let file = std::fs::File::open(path).map_err(|e| {
                    AgentError::ProcessError(format!("Failed to open {}: {}", path.display(), e))
                })?;
                command.stdin(Stdio::from(file));
            }
            (None, OutputMode::Interactive) => {
                command.stdin(Stdio::inherit());
            }
            (None, _) => {
                command.stdin(Stdio::null());
            }
        }

        // a failed read must not leave the child running
        command.kill_on_drop(true);
        Ok(command)
    }
}

#[async_trait]
impl Transport for SystemTransport {
    async fn execute(&self, invocation: &Invocation) -> Result<CommandOutput, AgentError> {
        let mut command = self.command(invocation)?;
        let program = if invocation.target.is_local() { "bash" } else { "ssh" };
        let spawn_error =
            |e: std::io::Error| AgentError::ProcessError(format!("Failed to run {}: {}", program, e));

        debug!("Running on {}: {}", invocation.target, invocation.command);

        match invocation.mode {
            OutputMode::Capture => {
                let output = command.output().await.map_err(spawn_error)?;
                Ok(CommandOutput {
                    status: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                })
            }
            OutputMode::Stream => {
                let mut child = command
                    .stdout(Stdio::piped())
                    .stderr(Stdio::inherit())
                    .spawn()
                    .map_err(spawn_error)?;

                let stdout = child
                    .stdout
                    .take()
                    .ok_or_else(|| AgentError::Internal("child stdout not captured".to_string()))?;
                let mut reader = BufReader::new(stdout);
                let mut echo = tokio::io::stdout();
                let mut collected = Vec::new();
                let mut line = Vec::new();

                while reader.read_until(b'\n', &mut line).await? > 0 {
                    echo.write_all(&line).await?;
                    collected.extend_from_slice(&line);
                    line.clear();
                }
                echo.flush().await?;

                let status = child.wait().await?;
                Ok(CommandOutput {
                    status: status.code(),
                    stdout: String::from_utf8_lossy(&collected).into_owned(),
                    stderr: String::new(),
                })
            }
            OutputMode::Interactive => {
                let status = command
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .await
                    .map_err(spawn_error)?;
                Ok(CommandOutput {
                    status: status.code(),
                    ..Default::default()
                })
            }
        }
    }
}
