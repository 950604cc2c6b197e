//! Local audit log of dispatched commands

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};

use crate::errors::AgentError;
use crate::exec::transport::Invocation;
use crate::filesys::file::File;

/// Append-only record of every command hoist dispatches.
///
/// Written for post-hoc debugging; hoist never reads it back.
#[derive(Debug, Clone)]
pub struct AuditLog {
    file: File,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: File::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Record an invocation; called before it runs
    pub async fn record(&self, invocation: &Invocation) -> Result<(), AgentError> {
        let mut line = format!(
            "{} [{}] {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            invocation.target,
            invocation.command
        );
        if let Some(script) = &invocation.stdin_file {
            line.push_str(&format!(" < {}", script.display()));
        }
        line.push('\n');
        self.file.append(&line).await
    }

    /// Append captured command output verbatim
    pub async fn capture(&self, output: &str) -> Result<(), AgentError> {
        if output.is_empty() {
            return Ok(());
        }
        if output.ends_with('\n') {
            self.file.append(output).await
        } else {
            self.file.append(&format!("{}\n", output)).await
        }
    }
}
