//! Deploy history queries and revert

use tracing::info;

use crate::deploy::git;
use crate::deploy::workflow::{DeployReport, DeployRequest, Deployer};
use crate::errors::AgentError;
use crate::exec::executor::Executor;
use crate::storage::history::DeployHistory;
use crate::storage::layout::RemoteLayout;

/// Read-side of the deploy record, plus revert
pub struct History<'a> {
    executor: &'a Executor,
    layout: RemoteLayout,
}

impl<'a> History<'a> {
    pub fn new(executor: &'a Executor) -> Self {
        Self {
            executor,
            layout: RemoteLayout::from_config(executor.config()),
        }
    }

    /// Short hash of the working copy's HEAD
    pub async fn current_commit(&self) -> Result<String, AgentError> {
        let output = self
            .executor
            .run_checked(&git::short_head(&self.layout))
            .await?;
        Ok(output.stdout.trim().to_string())
    }

    /// The whole deploy record
    pub async fn deploys(&self) -> Result<DeployHistory, AgentError> {
        let output = self
            .executor
            .run_checked(&git::read_deploys(&self.layout))
            .await?;
        Ok(DeployHistory::parse(&output.stdout))
    }

    /// The n-th most recent deploy; 1 is current, 2 is previous
    pub async fn nth_deploy_commit(&self, n: usize) -> Result<String, AgentError> {
        let history = self.deploys().await?;
        history.nth(n).map(str::to_string).ok_or_else(|| {
            AgentError::HistoryError(format!(
                "no deploy at position {} ({} recorded)",
                n,
                history.len()
            ))
        })
    }

    /// Every deploy, most recent first, as `<index> <commit>` with index 0
    /// being the current deploy
    pub async fn list_deploys(&self) -> Result<Vec<String>, AgentError> {
        let history = self.deploys().await?;
        Ok(history
            .listing()
            .into_iter()
            .map(|(index, commit)| format!("{} {}", index, commit))
            .collect())
    }

    /// Deploy the commit `n` deploys before the current one
    pub async fn revert_to(&self, n: usize) -> Result<DeployReport, AgentError> {
        let position = n.checked_add(1).ok_or_else(|| {
            AgentError::HistoryError(format!("cannot revert {} deploys", n))
        })?;
        let commit = self.nth_deploy_commit(position).await?;
        info!("Reverting {} deploy(s) to {}", n, commit);

        Deployer::new(self.executor)
            .deploy(DeployRequest {
                git_ref: Some(commit),
                branch: None,
                preflight: false,
            })
            .await
    }
}
