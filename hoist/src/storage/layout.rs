//! Remote directory layout

use crate::storage::config::EnvConfig;

/// Folder name used when `appFolderName` is not configured
pub const DEFAULT_APP_FOLDER: &str = "source";

/// Paths of the deployed state on the target.
///
/// These are remote POSIX paths, kept as strings so they are never
/// reinterpreted by the local platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLayout {
    /// Base directory for everything hoist manages
    pub base_dir: String,

    /// Name of the working copy directory
    pub app_folder: String,
}

impl RemoteLayout {
    /// Create a new remote layout
    pub fn new(base_dir: impl Into<String>, app_folder: impl Into<String>) -> Self {
        let base_dir = base_dir.into();
        Self {
            base_dir: base_dir.trim_end_matches('/').to_string(),
            app_folder: app_folder.into(),
        }
    }

    /// Derive the layout from an environment configuration
    pub fn from_config(config: &EnvConfig) -> Self {
        Self::new(
            config.base_path(),
            config.app_folder_name().unwrap_or(DEFAULT_APP_FOLDER),
        )
    }

    /// The git working copy
    pub fn working_copy(&self) -> String {
        format!("{}/{}", self.base_dir, self.app_folder)
    }

    /// The symlink consumers follow
    pub fn current_link(&self) -> String {
        format!("{}/{}_current", self.base_dir, self.app_folder)
    }

    /// State shared between deploys, exported to hooks as `SHARED`
    pub fn shared_dir(&self) -> String {
        format!("{}/{}_shared", self.base_dir, self.app_folder)
    }

    pub fn logs_dir(&self) -> String {
        format!("{}/logs", self.shared_dir())
    }

    pub fn pids_dir(&self) -> String {
        format!("{}/pids", self.shared_dir())
    }

    /// The append-only deploy record
    pub fn deploys_file(&self) -> String {
        format!("{}/.deploys", self.base_dir)
    }

    /// Every directory setup creates, parents first
    pub fn skeleton(&self) -> Vec<String> {
        vec![
            self.base_dir.clone(),
            self.logs_dir(),
            self.pids_dir(),
            self.working_copy(),
        ]
    }
}
