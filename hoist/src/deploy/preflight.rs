//! Local repository checks run before a deploy

use thiserror::Error;
use tracing::debug;

use crate::errors::AgentError;
use crate::exec::executor::Executor;

/// Why the local repository is not ready to deploy from
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreflightFailure {
    #[error("not inside a git repository with at least one commit")]
    NotARepository,

    #[error("you have uncommitted changes")]
    UncommittedChanges,

    #[error("you have staged changes")]
    StagedChanges,

    #[error("you have unpushed commits")]
    UnpushedCommits,
}

const VERIFY_HEAD: &str = "git rev-parse --verify HEAD";
const REFRESH_INDEX: &str = "git update-index -q --ignore-submodules --refresh";
const UNSTAGED_CHANGES: &str = "git diff-files --quiet --ignore-submodules --";
const STAGED_CHANGES: &str = "git diff-index --cached --quiet HEAD --ignore-submodules --";
const UNPUSHED_COMMITS: &str = "git log --branches --not --remotes --oneline";

/// Verify the local repository driving the deploy is clean and pushed.
///
/// Always runs on this machine, whatever host the environment targets.
pub async fn check_local_repository(executor: &Executor) -> Result<(), AgentError> {
    let failed = |failure| Err(AgentError::PreflightError(failure));

    if !executor.run_local(VERIFY_HEAD).await?.success() {
        return failed(PreflightFailure::NotARepository);
    }

    // stat-only changes would otherwise show up as unstaged
    executor.run_local(REFRESH_INDEX).await?;

    if !executor.run_local(UNSTAGED_CHANGES).await?.success() {
        return failed(PreflightFailure::UncommittedChanges);
    }

    if !executor.run_local(STAGED_CHANGES).await?.success() {
        return failed(PreflightFailure::StagedChanges);
    }

    let unpushed = executor
        .run_local(UNPUSHED_COMMITS)
        .await?
        .check(UNPUSHED_COMMITS)?;
    if !unpushed.stdout.trim().is_empty() {
        debug!("Unpushed commits:\n{}", unpushed.stdout.trim_end());
        return failed(PreflightFailure::UnpushedCommits);
    }

    Ok(())
}
