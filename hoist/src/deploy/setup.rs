//! First-time setup of a target

use tracing::{error, info};

use crate::deploy::fsm::{SetupStage, WorkflowEvent, WorkflowFsm};
use crate::deploy::git;
use crate::deploy::hooks::{HookPoint, HookRunner};
use crate::errors::AgentError;
use crate::exec::executor::Executor;
use crate::storage::layout::RemoteLayout;

/// Bootstraps the directory skeleton and the initial clone
pub struct Setup<'a> {
    executor: &'a Executor,
    layout: RemoteLayout,
}

impl<'a> Setup<'a> {
    pub fn new(executor: &'a Executor) -> Self {
        Self {
            executor,
            layout: RemoteLayout::from_config(executor.config()),
        }
    }

    /// Run every setup stage, stopping at the first failure
    pub async fn run(&self) -> Result<(), AgentError> {
        info!("Setting up {} on {}", self.layout.working_copy(), self.executor.target());

        let mut fsm = WorkflowFsm::<SetupStage>::new();
        match self.run_stages(&mut fsm).await {
            Ok(()) => {
                fsm.process(WorkflowEvent::Finish)?;
                info!("Setup complete");
                Ok(())
            }
            Err(e) => {
                let e = fsm.fail(e);
                error!("{}", e);
                Err(e)
            }
        }
    }

    async fn run_stages(&self, fsm: &mut WorkflowFsm<SetupStage>) -> Result<(), AgentError> {
        let config = self.executor.config();
        let hooks = HookRunner::new(self.executor, &self.layout);

        fsm.enter(SetupStage::PreSetupHook)?;
        hooks.run(HookPoint::PreSetup).await?;

        fsm.enter(SetupStage::Paths)?;
        self.executor
            .run_checked(&git::make_dirs(&self.layout))
            .await?;

        fsm.enter(SetupStage::Clone)?;
        let branch = config.git_ref().map(git::branch_from_ref);
        self.executor
            .run_checked(&git::clone(
                config.repo(),
                branch,
                &self.layout,
                config.fetch_mode(),
            ))
            .await?;

        fsm.enter(SetupStage::Symlink)?;
        self.executor
            .run_checked(&git::link_current(&self.layout))
            .await?;

        fsm.enter(SetupStage::PostSetupHook)?;
        hooks.run(HookPoint::PostSetup).await?;

        Ok(())
    }
}
