//! Finite state machine for the setup and deploy workflows
//!
//! Both workflows are a fixed sequence of stages. The machine only allows
//! entering the stage that directly follows the current one, so a workflow
//! can neither skip nor repeat a stage, and a failure pins the stage that
//! caused it.

use std::fmt;

use crate::errors::AgentError;

/// An ordered workflow stage
pub trait Stage: Copy + Eq + fmt::Debug + fmt::Display + 'static {
    /// All stages in execution order
    const ORDER: &'static [Self];

    /// Build the workflow error for a failure at this stage
    fn failure(self, reason: String) -> AgentError;

    /// The stage after this one, if any
    fn next(self) -> Option<Self> {
        let index = Self::ORDER.iter().position(|s| *s == self)?;
        Self::ORDER.get(index + 1).copied()
    }
}

/// Stages of `setup`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetupStage {
    PreSetupHook,
    Paths,
    Clone,
    Symlink,
    PostSetupHook,
}

impl Stage for SetupStage {
    const ORDER: &'static [Self] = &[
        SetupStage::PreSetupHook,
        SetupStage::Paths,
        SetupStage::Clone,
        SetupStage::Symlink,
        SetupStage::PostSetupHook,
    ];

    fn failure(self, reason: String) -> AgentError {
        AgentError::SetupFailed {
            stage: self,
            reason,
        }
    }
}

impl fmt::Display for SetupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SetupStage::PreSetupHook => "pre-setup hook",
            SetupStage::Paths => "paths",
            SetupStage::Clone => "clone",
            SetupStage::Symlink => "symlink",
            SetupStage::PostSetupHook => "post-setup hook",
        };
        f.write_str(name)
    }
}

/// Stages of `deploy`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeployStage {
    LocalPreflight,
    PreDeployLocal,
    PreDeployHook,
    Fetch,
    ResolveRef,
    Reset,
    Symlink,
    RecordHistory,
    PostDeployHook,
}

impl Stage for DeployStage {
    const ORDER: &'static [Self] = &[
        DeployStage::LocalPreflight,
        DeployStage::PreDeployLocal,
        DeployStage::PreDeployHook,
        DeployStage::Fetch,
        DeployStage::ResolveRef,
        DeployStage::Reset,
        DeployStage::Symlink,
        DeployStage::RecordHistory,
        DeployStage::PostDeployHook,
    ];

    fn failure(self, reason: String) -> AgentError {
        AgentError::DeployFailed {
            stage: self,
            reason,
        }
    }
}

impl fmt::Display for DeployStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeployStage::LocalPreflight => "local-preflight",
            DeployStage::PreDeployLocal => "pre-deploy-local hook",
            DeployStage::PreDeployHook => "pre-deploy hook",
            DeployStage::Fetch => "fetch",
            DeployStage::ResolveRef => "ref-resolution",
            DeployStage::Reset => "reset",
            DeployStage::Symlink => "symlink-update",
            DeployStage::RecordHistory => "history-append",
            DeployStage::PostDeployHook => "post-deploy hook",
        };
        f.write_str(name)
    }
}

/// Workflow state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState<S> {
    /// Not started
    Pending,

    /// Executing a stage
    Running(S),

    /// Every stage completed
    Done,

    /// Aborted at a stage
    Failed { stage: S, error: String },
}

/// Workflow event
#[derive(Debug, Clone)]
pub enum WorkflowEvent<S> {
    /// Begin a stage; the previous one, if any, completed
    Enter(S),

    /// The last stage completed
    Finish,

    /// The running stage failed
    Fail(String),
}

/// Sequential workflow FSM
#[derive(Debug, Clone)]
pub struct WorkflowFsm<S: Stage> {
    state: WorkflowState<S>,
    completed: Vec<S>,
}

impl<S: Stage> WorkflowFsm<S> {
    /// Create a new FSM in pending state
    pub fn new() -> Self {
        Self {
            state: WorkflowState::Pending,
            completed: Vec::new(),
        }
    }

    /// Get current state
    pub fn state(&self) -> &WorkflowState<S> {
        &self.state
    }

    /// Stages that ran to completion, in order
    pub fn completed(&self) -> &[S] {
        &self.completed
    }

    /// Get error message if any
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            WorkflowState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: WorkflowEvent<S>) -> Result<(), AgentError> {
        let first = S::ORDER.first().copied();

        let new_state = match (&self.state, &event) {
            // From Pending
            (WorkflowState::Pending, WorkflowEvent::Enter(stage)) if Some(*stage) == first => {
                WorkflowState::Running(*stage)
            }

            // From Running
            (WorkflowState::Running(current), WorkflowEvent::Enter(stage))
                if current.next() == Some(*stage) =>
            {
                self.completed.push(*current);
                WorkflowState::Running(*stage)
            }
            (WorkflowState::Running(current), WorkflowEvent::Finish) if current.next().is_none() => {
                self.completed.push(*current);
                WorkflowState::Done
            }
            (WorkflowState::Running(current), WorkflowEvent::Fail(error)) => WorkflowState::Failed {
                stage: *current,
                error: error.clone(),
            },

            // Invalid transitions
            (state, event) => {
                return Err(AgentError::InvalidTransition(format!(
                    "{:?} -> {:?}",
                    state, event
                )));
            }
        };

        self.state = new_state;
        Ok(())
    }

    /// Begin the given stage
    pub fn enter(&mut self, stage: S) -> Result<(), AgentError> {
        self.process(WorkflowEvent::Enter(stage))
    }

    /// Attribute an error to the running stage.
    ///
    /// Returns the stage-specific workflow error, or the original error when
    /// no stage is running.
    pub fn fail(&mut self, error: AgentError) -> AgentError {
        match self.state {
            WorkflowState::Running(stage) => {
                let reason = error.to_string();
                self.state = WorkflowState::Failed {
                    stage,
                    error: reason.clone(),
                };
                stage.failure(reason)
            }
            _ => error,
        }
    }
}

impl<S: Stage> Default for WorkflowFsm<S> {
    fn default() -> Self {
        Self::new()
    }
}
