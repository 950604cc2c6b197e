//! Verb dispatch

use std::sync::Arc;

use tracing::{debug, info};

use crate::app::options::AppOptions;
use crate::deploy::git;
use crate::deploy::history::History;
use crate::deploy::setup::Setup;
use crate::deploy::workflow::{DeployRequest, Deployer};
use crate::errors::AgentError;
use crate::exec::audit::AuditLog;
use crate::exec::executor::Executor;
use crate::exec::transport::SystemTransport;
use crate::storage::config::EnvConfig;
use crate::storage::layout::RemoteLayout;

/// A top-level operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    /// Bootstrap the target
    Setup,

    /// Deploy a ref, or the configured/most recent one
    Deploy {
        git_ref: Option<String>,
        branch: Option<String>,
    },

    /// Short hash of the deployed HEAD
    Current,

    /// Commit of the deploy before the current one
    Previous,

    /// Commit of the n-th most recent deploy
    Commit(usize),

    /// All deploys, most recent first
    List,

    /// Redeploy the commit n deploys back
    Revert(usize),

    /// Run a command in the working copy
    Run(String),

    /// Interactive shell in the working copy
    Console,

    /// Print a configuration value
    ConfigGet(String),
}

/// What the caller should show once a verb succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Progress was already logged
    Silent,

    /// Text for stdout
    Print(String),
}

/// Load the environment and run a verb against it
pub async fn run(options: &AppOptions, verb: Verb) -> Result<Outcome, AgentError> {
    if let Some(dir) = &options.chdir {
        std::env::set_current_dir(dir).map_err(|e| {
            AgentError::ConfigError(format!("Cannot change directory to {}: {}", dir.display(), e))
        })?;
        debug!("Changed directory to {}", dir.display());
    }

    let config = EnvConfig::load(&options.config_path).await?;
    let executor = Executor::new(
        Arc::new(config),
        Arc::new(SystemTransport::new()),
        AuditLog::new(options.audit_log.clone()),
    );
    debug!("Auditing commands to {}", executor.audit().path().display());

    dispatch(options, &executor, verb).await
}

/// Route a verb to its handler
pub async fn dispatch(
    options: &AppOptions,
    executor: &Executor,
    verb: Verb,
) -> Result<Outcome, AgentError> {
    match verb {
        Verb::Setup => {
            Setup::new(executor).run().await?;
            Ok(Outcome::Silent)
        }
        Verb::Deploy { git_ref, branch } => {
            let git_ref = git_ref.or_else(|| executor.config().git_ref().map(str::to_string));
            Deployer::new(executor)
                .deploy(DeployRequest {
                    git_ref,
                    branch,
                    preflight: !options.force,
                })
                .await?;
            Ok(Outcome::Silent)
        }
        Verb::Current => {
            let commit = History::new(executor).current_commit().await?;
            Ok(Outcome::Print(commit))
        }
        Verb::Previous => {
            let commit = History::new(executor).nth_deploy_commit(2).await?;
            Ok(Outcome::Print(commit))
        }
        Verb::Commit(n) => {
            let commit = History::new(executor).nth_deploy_commit(n).await?;
            Ok(Outcome::Print(commit))
        }
        Verb::List => {
            let lines = History::new(executor).list_deploys().await?;
            if lines.is_empty() {
                info!("No deploys recorded yet");
                return Ok(Outcome::Silent);
            }
            Ok(Outcome::Print(lines.join("\n")))
        }
        Verb::Revert(n) => {
            History::new(executor).revert_to(n).await?;
            Ok(Outcome::Silent)
        }
        Verb::Run(command) => {
            let layout = RemoteLayout::from_config(executor.config());
            let full = git::in_working_copy(&layout, &command);
            let teed = executor.run_teed(executor.target(), &full).await?;
            teed.output.check(&command)?;
            Ok(Outcome::Silent)
        }
        Verb::Console => {
            let layout = RemoteLayout::from_config(executor.config());
            executor.run_interactive(&git::login_shell(&layout)).await?;
            Ok(Outcome::Silent)
        }
        Verb::ConfigGet(key) => Ok(Outcome::Print(executor.config().get(&key))),
    }
}
