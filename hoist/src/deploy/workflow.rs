//! Deploy workflow
//!
//! `local-preflight -> pre-deploy-local -> pre-deploy -> fetch ->
//! ref-resolution -> reset -> symlink-update -> history-append -> post-deploy`
//!
//! Each stage runs only after the previous one succeeded. A failure aborts
//! the deploy and is reported against its stage; nothing is rolled back, so
//! the working copy may be left between two commits.

use tracing::{debug, error, info};

use crate::deploy::fsm::{DeployStage, WorkflowEvent, WorkflowFsm};
use crate::deploy::git;
use crate::deploy::hooks::{HookPoint, HookRunner};
use crate::deploy::preflight::check_local_repository;
use crate::errors::AgentError;
use crate::exec::executor::Executor;
use crate::storage::layout::RemoteLayout;

/// What to deploy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployRequest {
    /// Ref to reset to; the most recently authored ref when absent
    pub git_ref: Option<String>,

    /// Branch name; derived from the ref when absent
    pub branch: Option<String>,

    /// Check the local repository before touching the target
    pub preflight: bool,
}

/// Outcome of a successful deploy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    /// The ref the working copy was reset to
    pub git_ref: String,

    /// Branch derived from (or supplied with) the ref. Reported only; the
    /// reset always targets `git_ref`.
    pub branch: String,
}

/// Runs the deploy state machine against the configured target
pub struct Deployer<'a> {
    executor: &'a Executor,
    layout: RemoteLayout,
}

impl<'a> Deployer<'a> {
    pub fn new(executor: &'a Executor) -> Self {
        Self {
            executor,
            layout: RemoteLayout::from_config(executor.config()),
        }
    }

    pub async fn deploy(&self, request: DeployRequest) -> Result<DeployReport, AgentError> {
        let mut fsm = WorkflowFsm::<DeployStage>::new();
        match self.run_stages(&mut fsm, request).await {
            Ok(report) => {
                fsm.process(WorkflowEvent::Finish)?;
                info!("Successfully deployed {}", report.git_ref);
                Ok(report)
            }
            Err(e) => {
                let e = fsm.fail(e);
                error!("{}", e);
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        fsm: &mut WorkflowFsm<DeployStage>,
        request: DeployRequest,
    ) -> Result<DeployReport, AgentError> {
        let config = self.executor.config();
        let hooks = HookRunner::new(self.executor, &self.layout);

        fsm.enter(DeployStage::LocalPreflight)?;
        if request.preflight {
            check_local_repository(self.executor).await?;
        } else {
            debug!("Skipping local preflight");
        }

        fsm.enter(DeployStage::PreDeployLocal)?;
        hooks.run(HookPoint::PreDeployLocal).await?;

        fsm.enter(DeployStage::PreDeployHook)?;
        hooks.run(HookPoint::PreDeploy).await?;

        fsm.enter(DeployStage::Fetch)?;
        info!("Fetching updates on {}", self.executor.target());
        self.executor
            .run_checked(&git::fetch(&self.layout, config.fetch_mode()))
            .await?;

        fsm.enter(DeployStage::ResolveRef)?;
        let git_ref = match request.git_ref.filter(|r| !r.is_empty()) {
            Some(git_ref) => git_ref,
            None => self.latest_ref().await?,
        };
        let branch = request
            .branch
            .unwrap_or_else(|| git::branch_from_ref(&git_ref).to_string());
        debug!("Deploying ref {} (branch {})", git_ref, branch);

        fsm.enter(DeployStage::Reset)?;
        info!("Resetting working copy to {}", git_ref);
        self.executor
            .run_checked(&git::reset_hard(&self.layout, &git_ref))
            .await?;

        fsm.enter(DeployStage::Symlink)?;
        self.executor
            .run_checked(&git::link_current(&self.layout))
            .await?;

        fsm.enter(DeployStage::RecordHistory)?;
        self.executor
            .run_checked(&git::record_head(&self.layout))
            .await?;

        fsm.enter(DeployStage::PostDeployHook)?;
        hooks.run(HookPoint::PostDeploy).await?;

        Ok(DeployReport { git_ref, branch })
    }

    async fn latest_ref(&self) -> Result<String, AgentError> {
        let output = self
            .executor
            .run_checked(&git::latest_ref(&self.layout))
            .await?;
        let git_ref = output.stdout.trim();
        if git_ref.is_empty() {
            return Err(AgentError::ResolutionError(
                "no refs found in the working copy".to_string(),
            ));
        }
        info!("No ref given, using most recent ref {}", git_ref);
        Ok(git_ref.to_string())
    }
}
