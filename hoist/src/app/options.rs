//! Application configuration options

use std::path::PathBuf;

use crate::logs::LogOptions;

/// Default environment configuration file
pub const DEFAULT_CONFIG_FILE: &str = "deploy.json";

/// Options fixed for the whole invocation
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Environment configuration file, relative to `chdir` when set
    pub config_path: PathBuf,

    /// Directory to switch to before anything else runs
    pub chdir: Option<PathBuf>,

    /// Skip the local repository checks before a deploy
    pub force: bool,

    /// Local audit log of dispatched commands
    pub audit_log: PathBuf,

    /// Logging configuration
    pub log: LogOptions,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            chdir: None,
            force: false,
            audit_log: default_audit_log(),
            log: LogOptions::default(),
        }
    }
}

/// `hoist.log` in the system temporary directory
pub fn default_audit_log() -> PathBuf {
    std::env::temp_dir().join("hoist.log")
}
