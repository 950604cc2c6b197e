//! Git and filesystem commands issued on the target

use crate::storage::config::FetchMode;
use crate::storage::layout::RemoteLayout;

/// Branch part of a ref: everything up to the first `/` is dropped, so
/// `origin/main` becomes `main` and a bare name or hash is unchanged
pub fn branch_from_ref(git_ref: &str) -> &str {
    match git_ref.split_once('/') {
        Some((_, branch)) => branch,
        None => git_ref,
    }
}

/// Create the directory skeleton; existing directories are fine
pub fn make_dirs(layout: &RemoteLayout) -> String {
    format!("mkdir -p {}", layout.skeleton().join(" "))
}

/// Clone the repository into the working copy
pub fn clone(repo: &str, branch: Option<&str>, layout: &RemoteLayout, mode: FetchMode) -> String {
    let mut command = String::from("git clone");
    if let Some(depth) = mode.depth_arg() {
        command.push(' ');
        command.push_str(&depth);
    }
    if let Some(branch) = branch.filter(|b| !b.is_empty()) {
        command.push_str(" --branch ");
        command.push_str(branch);
    }
    format!("{} {} {}", command, repo, layout.working_copy())
}

/// Point the current symlink at the working copy.
///
/// The new link is created beside the old one and renamed over it, so
/// readers see either the old target or the new one.
pub fn link_current(layout: &RemoteLayout) -> String {
    let link = layout.current_link();
    format!(
        "ln -sfn {target} {link}.tmp && mv -Tf {link}.tmp {link}",
        target = layout.working_copy(),
        link = link
    )
}

pub fn fetch(layout: &RemoteLayout, mode: FetchMode) -> String {
    match mode.depth_arg() {
        Some(depth) => format!(
            "cd {} && git fetch {} --all --tags",
            layout.working_copy(),
            depth
        ),
        None => format!("cd {} && git fetch --all --tags", layout.working_copy()),
    }
}

/// Short name of the most recently authored ref
pub fn latest_ref(layout: &RemoteLayout) -> String {
    format!(
        "cd {} && git for-each-ref --sort=-authordate --count=1 --format='%(refname:short)'",
        layout.working_copy()
    )
}

pub fn reset_hard(layout: &RemoteLayout, git_ref: &str) -> String {
    format!("cd {} && git reset --hard {}", layout.working_copy(), git_ref)
}

/// Append the full hash of HEAD to the deploy record
pub fn record_head(layout: &RemoteLayout) -> String {
    format!(
        "cd {} && git rev-parse HEAD >> {}",
        layout.working_copy(),
        layout.deploys_file()
    )
}

pub fn short_head(layout: &RemoteLayout) -> String {
    format!("cd {} && git rev-parse --short HEAD", layout.working_copy())
}

/// Print the deploy record; a record that does not exist yet reads as empty
pub fn read_deploys(layout: &RemoteLayout) -> String {
    let file = layout.deploys_file();
    format!("if [ -f {file} ]; then cat {file}; fi", file = file)
}

/// Run an ad-hoc command inside the working copy
pub fn in_working_copy(layout: &RemoteLayout, command: &str) -> String {
    format!("cd {} && (\n{}\n) 2>&1", layout.working_copy(), command)
}

/// Open a login shell inside the working copy
pub fn login_shell(layout: &RemoteLayout) -> String {
    format!("cd {} && exec $SHELL --login", layout.working_copy())
}
