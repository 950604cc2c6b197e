//! Error types for hoist

use thiserror::Error;

use crate::deploy::fsm::{DeployStage, SetupStage};
use crate::deploy::hooks::HookPoint;
use crate::deploy::preflight::PreflightFailure;

/// Main error type for hoist
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Process error: {0}")]
    ProcessError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cannot deploy: {0}")]
    PreflightError(PreflightFailure),

    #[error("Hook `{hook}` failed with {}", status_text(.status))]
    HookFailed {
        hook: HookPoint,
        status: Option<i32>,
    },

    #[error("Setup failed at {stage}: {reason}")]
    SetupFailed { stage: SetupStage, reason: String },

    #[error("Deploy failed at {stage}: {reason}")]
    DeployFailed { stage: DeployStage, reason: String },

    #[error("Command `{command}` failed with {}{}", status_text(.status), stderr_suffix(.stderr))]
    CommandFailed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Cannot resolve ref: {0}")]
    ResolutionError(String),

    #[error("History error: {0}")]
    HistoryError(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Render an exit status for error messages
pub fn describe_status(status: Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {}", code),
        None => "no exit status (terminated by signal)".to_string(),
    }
}

fn status_text(status: &Option<i32>) -> String {
    describe_status(*status)
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}
