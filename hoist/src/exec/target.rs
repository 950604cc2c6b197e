//! Execution targets

use std::fmt;
use std::path::PathBuf;

use crate::storage::config::{EnvConfig, LOCALHOST};

/// Where a command runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A fresh shell on this machine
    Local,

    /// A remote shell reached over ssh
    Remote(SshTarget),
}

impl Target {
    /// Route from the configured `host`: exactly `localhost` runs locally,
    /// any other value goes over ssh.
    pub fn resolve(config: &EnvConfig) -> Self {
        if config.host() == LOCALHOST {
            Target::Local
        } else {
            Target::Remote(SshTarget::from_config(config))
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Target::Local)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Local => write!(f, "local"),
            Target::Remote(ssh) => write!(f, "{}", ssh.destination()),
        }
    }
}

/// Connection parameters for the ssh transport
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SshTarget {
    pub host: String,
    pub user: Option<String>,
    pub port: Option<String>,
    pub identity_file: Option<PathBuf>,
    pub forward_agent: bool,
    pub needs_tty: bool,
    pub options: Vec<String>,
}

impl SshTarget {
    pub fn from_config(config: &EnvConfig) -> Self {
        Self {
            host: config.host().to_string(),
            user: config.user().map(str::to_string),
            port: config.port().map(str::to_string),
            identity_file: config.identity_file(),
            forward_agent: config.forwards_agent(),
            needs_tty: config.needs_tty(),
            options: config.ssh_options(),
        }
    }

    /// `user@host`, or just `host` without a user
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }

    /// Arguments for `ssh`, up to and including the destination
    pub fn args(&self, tty: bool) -> Vec<String> {
        let mut args = Vec::new();
        if self.forward_agent {
            args.push("-A".to_string());
        }
        if tty {
            args.push("-t".to_string());
        }
        if let Some(identity) = &self.identity_file {
            args.push("-i".to_string());
            args.push(identity.display().to_string());
        }
        if let Some(port) = &self.port {
            args.push("-p".to_string());
            args.push(port.clone());
        }
        args.extend(self.options.iter().cloned());
        args.push(self.destination());
        args
    }
}
