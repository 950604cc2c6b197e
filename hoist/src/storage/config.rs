//! Environment configuration

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::deploy::hooks::HookPoint;
use crate::errors::AgentError;
use crate::filesys::file::File;

/// Host value that routes execution to the local machine
pub const LOCALHOST: &str = "localhost";

/// Fetch/clone depth used in fast mode
pub const FAST_FETCH_DEPTH: u32 = 5;

/// How much history setup clones and deploy fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Complete history
    Full,
    /// Shallow history of `FAST_FETCH_DEPTH` commits
    Fast,
}

impl FetchMode {
    /// The `--depth` argument for git, if any
    pub fn depth_arg(&self) -> Option<String> {
        match self {
            FetchMode::Full => None,
            FetchMode::Fast => Some(format!("--depth={}", FAST_FETCH_DEPTH)),
        }
    }
}

/// Configuration of one deployment environment.
///
/// Every field is optional: an absent key is a valid state that the workflows
/// interpret (no `fetch` means a full fetch, no hook means nothing to run).
/// Values that are not scalars are treated as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvConfig {
    #[serde(default, deserialize_with = "scalar")]
    pub host: Option<String>,

    #[serde(default, deserialize_with = "scalar")]
    pub user: Option<String>,

    #[serde(default, deserialize_with = "scalar")]
    pub port: Option<String>,

    /// Identity file, `~` not yet expanded
    #[serde(default, deserialize_with = "scalar")]
    pub key: Option<String>,

    #[serde(default, rename = "forward-agent", deserialize_with = "scalar")]
    pub forward_agent: Option<String>,

    /// Raw extra ssh arguments
    #[serde(default, deserialize_with = "scalar")]
    pub ssh_options: Option<String>,

    #[serde(default, deserialize_with = "scalar")]
    pub needs_tty: Option<String>,

    /// Remote base directory
    #[serde(default, deserialize_with = "scalar")]
    pub path: Option<String>,

    /// Git URL cloned during setup
    #[serde(default, deserialize_with = "scalar")]
    pub repo: Option<String>,

    #[serde(default, rename = "ref", deserialize_with = "scalar")]
    pub git_ref: Option<String>,

    #[serde(default, rename = "appFolderName", deserialize_with = "scalar")]
    pub app_folder_name: Option<String>,

    #[serde(default, deserialize_with = "scalar")]
    pub fetch: Option<String>,

    #[serde(default, rename = "pre-setup", deserialize_with = "scalar")]
    pub pre_setup: Option<String>,

    #[serde(default, rename = "post-setup", deserialize_with = "scalar")]
    pub post_setup: Option<String>,

    #[serde(default, rename = "pre-deploy-local", deserialize_with = "scalar")]
    pub pre_deploy_local: Option<String>,

    #[serde(default, rename = "pre-deploy", deserialize_with = "scalar")]
    pub pre_deploy: Option<String>,

    #[serde(default, rename = "post-deploy", deserialize_with = "scalar")]
    pub post_deploy: Option<String>,

    /// Keys hoist does not interpret, still reachable through `get`
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Keep strings, stringify numbers and `true`; anything else is absent.
fn scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_value(&value))
}

fn scalar_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

impl EnvConfig {
    /// Load the configuration from a flat JSON document
    pub async fn load(path: &Path) -> Result<Self, AgentError> {
        let file = File::new(path);
        if !file.is_file().await {
            return Err(AgentError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        file.read_json::<EnvConfig>().await
    }

    /// Parse the configuration from a JSON string
    pub fn from_json(contents: &str) -> Result<Self, AgentError> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Look up a raw value by its document key; empty when absent
    pub fn get(&self, key: &str) -> String {
        let known = match key {
            "host" => &self.host,
            "user" => &self.user,
            "port" => &self.port,
            "key" => &self.key,
            "forward-agent" => &self.forward_agent,
            "ssh_options" => &self.ssh_options,
            "needs_tty" => &self.needs_tty,
            "path" => &self.path,
            "repo" => &self.repo,
            "ref" => &self.git_ref,
            "appFolderName" => &self.app_folder_name,
            "fetch" => &self.fetch,
            "pre-setup" => &self.pre_setup,
            "post-setup" => &self.post_setup,
            "pre-deploy-local" => &self.pre_deploy_local,
            "pre-deploy" => &self.pre_deploy,
            "post-deploy" => &self.post_deploy,
            _ => {
                return self
                    .extra
                    .get(key)
                    .and_then(scalar_value)
                    .unwrap_or_default()
            }
        };
        known.clone().unwrap_or_default()
    }

    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or_default()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    /// Identity file with a leading `~` expanded to the home directory
    pub fn identity_file(&self) -> Option<PathBuf> {
        self.key.as_deref().map(expand_tilde)
    }

    pub fn forwards_agent(&self) -> bool {
        self.forward_agent.is_some()
    }

    pub fn needs_tty(&self) -> bool {
        self.needs_tty.is_some()
    }

    /// Extra ssh arguments, split on whitespace
    pub fn ssh_options(&self) -> Vec<String> {
        self.ssh_options
            .as_deref()
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn base_path(&self) -> &str {
        self.path.as_deref().unwrap_or_default()
    }

    pub fn repo(&self) -> &str {
        self.repo.as_deref().unwrap_or_default()
    }

    pub fn git_ref(&self) -> Option<&str> {
        self.git_ref.as_deref()
    }

    pub fn app_folder_name(&self) -> Option<&str> {
        self.app_folder_name.as_deref()
    }

    pub fn fetch_mode(&self) -> FetchMode {
        match self.fetch.as_deref() {
            Some("fast") => FetchMode::Fast,
            _ => FetchMode::Full,
        }
    }

    /// Command bound to a lifecycle point, if one is configured
    pub fn hook(&self, point: HookPoint) -> Option<&str> {
        let command = match point {
            HookPoint::PreSetup => &self.pre_setup,
            HookPoint::PostSetup => &self.post_setup,
            HookPoint::PreDeployLocal => &self.pre_deploy_local,
            HookPoint::PreDeploy => &self.pre_deploy,
            HookPoint::PostDeploy => &self.post_deploy,
        };
        command.as_deref().filter(|c| !c.trim().is_empty())
    }
}

/// Expand a leading `~` to the current user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    let home = || dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
    if path == "~" {
        home()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home().join(rest)
    } else {
        PathBuf::from(path)
    }
}
