//! Lifecycle hooks

use std::fmt;

use tracing::{info, warn};

use crate::errors::AgentError;
use crate::exec::executor::{Executor, Teed};
use crate::exec::target::Target;
use crate::filesys::file::File;
use crate::storage::layout::RemoteLayout;

/// A named point in the setup/deploy lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    PreSetup,
    PostSetup,
    PreDeployLocal,
    PreDeploy,
    PostDeploy,
}

impl HookPoint {
    pub const ALL: [HookPoint; 5] = [
        HookPoint::PreSetup,
        HookPoint::PostSetup,
        HookPoint::PreDeployLocal,
        HookPoint::PreDeploy,
        HookPoint::PostDeploy,
    ];

    /// Configuration key the hook command is stored under
    pub fn key(&self) -> &'static str {
        match self {
            HookPoint::PreSetup => "pre-setup",
            HookPoint::PostSetup => "post-setup",
            HookPoint::PreDeployLocal => "pre-deploy-local",
            HookPoint::PreDeploy => "pre-deploy",
            HookPoint::PostDeploy => "post-deploy",
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Runs configured hook commands through the executor
pub struct HookRunner<'a> {
    executor: &'a Executor,
    layout: &'a RemoteLayout,
}

impl<'a> HookRunner<'a> {
    pub fn new(executor: &'a Executor, layout: &'a RemoteLayout) -> Self {
        Self { executor, layout }
    }

    /// Run the hook bound to `point`. An unconfigured hook is a no-op.
    pub async fn run(&self, point: HookPoint) -> Result<(), AgentError> {
        let Some(command) = self.executor.config().hook(point) else {
            info!("No {} hook configured, skipping", point);
            return Ok(());
        };

        info!("Running {} hook: {}", point, command);
        let teed = match point {
            HookPoint::PreDeployLocal => {
                self.executor
                    .run_teed(Target::Local, &combine_output(command))
                    .await?
            }
            HookPoint::PreSetup => match local_script(command).await {
                Some((script, args)) => {
                    info!("Streaming local script {} to {}", script, self.executor.target());
                    self.executor
                        .run_script(std::path::Path::new(&script), &args)
                        .await?
                }
                None => self.run_in_current(command).await?,
            },
            _ => self.run_in_current(command).await?,
        };

        if let Some(log_error) = &teed.log_error {
            warn!("{} hook output was not fully logged: {}", point, log_error);
        }

        if teed.success() {
            Ok(())
        } else {
            Err(AgentError::HookFailed {
                hook: point,
                status: teed.output.status,
            })
        }
    }

    async fn run_in_current(&self, command: &str) -> Result<Teed, AgentError> {
        self.executor
            .run_teed(self.executor.target(), &self.wrap(command))
            .await
    }

    /// The composite command a remote hook runs as
    pub fn wrap(&self, command: &str) -> String {
        format!(
            "cd {}; export SHARED=\"{}\"; {}",
            self.layout.current_link(),
            self.layout.shared_dir(),
            combine_output(command)
        )
    }
}

/// Run `command` in a subshell with stderr folded into stdout; the subshell
/// exits with the command's own status. The command sits on its own line so
/// a trailing `#` comment cannot swallow the closing paren.
fn combine_output(command: &str) -> String {
    format!("(\n{}\n) 2>&1", command)
}

/// Split a hook value into a local script and its arguments when the first
/// token names an existing local file
async fn local_script(command: &str) -> Option<(String, Vec<&str>)> {
    let mut tokens = command.split_whitespace();
    let first = tokens.next()?;
    if File::new(first).is_file().await {
        Some((first.to_string(), tokens.collect()))
    } else {
        None
    }
}
