//! Command executor

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::AgentError;
use crate::exec::audit::AuditLog;
use crate::exec::target::Target;
use crate::exec::transport::{CommandOutput, Invocation, OutputMode, Transport};
use crate::storage::config::EnvConfig;

/// Output of a command whose output was also teed into the audit log.
///
/// `output.status` is the command's own status; a failure to write the log
/// is kept apart in `log_error` and never changes the command's result.
#[derive(Debug, Clone)]
pub struct Teed {
    pub output: CommandOutput,
    pub log_error: Option<String>,
}

impl Teed {
    pub fn success(&self) -> bool {
        self.output.success()
    }
}

/// Dispatches commands to the configured target.
///
/// Every invocation is written to the audit log before it is handed to the
/// transport, so a crash mid-command still leaves a record.
pub struct Executor {
    config: Arc<EnvConfig>,
    transport: Arc<dyn Transport>,
    audit: AuditLog,
}

impl Executor {
    pub fn new(config: Arc<EnvConfig>, transport: Arc<dyn Transport>, audit: AuditLog) -> Self {
        Self {
            config,
            transport,
            audit,
        }
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// The target selected by the configured `host`
    pub fn target(&self) -> Target {
        Target::resolve(&self.config)
    }

    /// Record, then run, a single invocation
    pub async fn execute(&self, invocation: Invocation) -> Result<CommandOutput, AgentError> {
        self.audit.record(&invocation).await?;
        let output = self.transport.execute(&invocation).await?;
        debug!(
            "Command on {} exited with {:?}: {}",
            invocation.target, output.status, invocation.command
        );
        Ok(output)
    }

    /// Run on the configured target, capturing output
    pub async fn run(&self, command: &str) -> Result<CommandOutput, AgentError> {
        self.execute(Invocation::new(self.target(), command, OutputMode::Capture))
            .await
    }

    /// Run on the configured target; a non-zero exit is an error
    pub async fn run_checked(&self, command: &str) -> Result<CommandOutput, AgentError> {
        self.run(command).await?.check(command)
    }

    /// Run on this machine regardless of the configured host
    pub async fn run_local(&self, command: &str) -> Result<CommandOutput, AgentError> {
        self.execute(Invocation::new(Target::Local, command, OutputMode::Capture))
            .await
    }

    /// Run with live output, teeing that output into the audit log
    pub async fn run_teed(&self, target: Target, command: &str) -> Result<Teed, AgentError> {
        let output = self
            .execute(Invocation::new(target, command, OutputMode::Stream))
            .await?;
        Ok(self.tee(output).await)
    }

    /// Stream a local script to `bash -s` on the configured target
    pub async fn run_script(&self, script: &Path, args: &[&str]) -> Result<Teed, AgentError> {
        let mut command = String::from("bash -s --");
        for arg in args {
            command.push(' ');
            command.push_str(arg);
        }
        command.push_str(" 2>&1");
        let output = self
            .execute(
                Invocation::new(self.target(), command, OutputMode::Stream)
                    .with_stdin_file(script),
            )
            .await?;
        Ok(self.tee(output).await)
    }

    /// Hand the terminal to a command on the configured target
    pub async fn run_interactive(&self, command: &str) -> Result<CommandOutput, AgentError> {
        self.execute(Invocation::new(self.target(), command, OutputMode::Interactive))
            .await
    }

    async fn tee(&self, output: CommandOutput) -> Teed {
        let log_error = match self.audit.capture(&output.stdout).await {
            Ok(()) => None,
            Err(e) => {
                warn!("Failed to tee output into {}: {}", self.audit.path().display(), e);
                Some(e.to_string())
            }
        };
        Teed { output, log_error }
    }
}
