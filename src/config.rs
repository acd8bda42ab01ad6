use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::branch::join_url;
use crate::domain::BranchLayout;
use crate::error::{Result, SvnFlowError};
use crate::svn::repository::Credentials;

/// Environment variable overriding the configured repository password
pub const PASSWORD_ENV: &str = "SVNFLOWS_PASSWORD";

/// File name looked up in the current directory
pub const LOCAL_CONFIG_FILE: &str = "svnflows.toml";

/// Represents the complete configuration for svn-flows.
///
/// Contains the repository layout and credentials plus the local NodeRED
/// work directory settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub repository: RepositoryConfig,

    #[serde(default)]
    pub workspace: WorkspaceConfig,
}

/// Where trunk and branches live on the Subversion server.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RepositoryConfig {
    /// Server URL, e.g. `http://localhost`
    #[serde(default = "default_host")]
    pub host: String,

    /// Path of the NodeRED trunk below the host
    #[serde(default = "default_trunk_path")]
    pub trunk_path: String,

    /// Path below which branches are created
    #[serde(default = "default_branches_path")]
    pub branches_path: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,
}

fn default_host() -> String {
    "http://localhost".to_string()
}

fn default_trunk_path() -> String {
    "/svn/repo/trunk/nodered-live".to_string()
}

fn default_branches_path() -> String {
    "/svn/repo/branches".to_string()
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        RepositoryConfig {
            host: default_host(),
            trunk_path: default_trunk_path(),
            branches_path: default_branches_path(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl RepositoryConfig {
    pub fn trunk_url(&self) -> String {
        join_url(&self.host, &self.trunk_path)
    }

    pub fn branches_url(&self) -> String {
        join_url(&self.host, &self.branches_path)
    }

    pub fn layout(&self) -> BranchLayout {
        BranchLayout::new(self.trunk_url(), self.branches_url())
    }

    /// Credentials for the svn client, `None` when no username is configured
    pub fn credentials(&self) -> Option<Credentials> {
        if self.username.is_empty() {
            return None;
        }
        Some(Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        })
    }
}

/// The local NodeRED checkout.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WorkspaceConfig {
    /// NodeRED work directory, a working copy of trunk or a branch
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,

    /// Shell command run in the workdir after a fresh checkout
    #[serde(default = "default_install_command")]
    pub install_command: String,
}

fn default_workdir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".node-red"))
        .unwrap_or_else(|| PathBuf::from(".node-red"))
}

fn default_install_command() -> String {
    "npm install".to_string()
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        WorkspaceConfig {
            workdir: default_workdir(),
            install_command: default_install_command(),
        }
    }
}

impl Config {
    /// Parse a TOML document and apply environment overrides
    pub fn from_toml(text: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(text)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            if !password.is_empty() {
                self.repository.password = password;
            }
        }
    }

    /// Reject settings the workflow cannot operate with
    pub fn validate(&self) -> Result<()> {
        if self.repository.host.trim().is_empty() {
            return Err(SvnFlowError::config("repository.host must not be empty"));
        }
        if self.repository.trunk_path.trim().is_empty() {
            return Err(SvnFlowError::config("repository.trunk_path must not be empty"));
        }
        if self.repository.branches_path.trim().is_empty() {
            return Err(SvnFlowError::config(
                "repository.branches_path must not be empty",
            ));
        }
        if self.workspace.workdir.as_os_str().is_empty() {
            return Err(SvnFlowError::config("workspace.workdir must not be empty"));
        }
        Ok(())
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `svnflows.toml` in current directory
/// 3. `.svnflows.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// `SVNFLOWS_PASSWORD` overrides the password in every case.
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read, parsed or validated
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new(LOCAL_CONFIG_FILE).exists() {
        fs::read_to_string(LOCAL_CONFIG_FILE)?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(".svnflows.toml");
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Config::from_toml("");
        }
    } else {
        return Config::from_toml("");
    };

    Config::from_toml(&config_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let repo = RepositoryConfig {
            host: "http://192.168.1.10/".to_string(),
            trunk_path: "/svn/das/trunk/nodered-live".to_string(),
            branches_path: "/svn/das/branches".to_string(),
            ..RepositoryConfig::default()
        };

        assert_eq!(repo.trunk_url(), "http://192.168.1.10/svn/das/trunk/nodered-live");
        assert_eq!(repo.branches_url(), "http://192.168.1.10/svn/das/branches");
        assert_eq!(
            repo.layout().branch_url("x"),
            "http://192.168.1.10/svn/das/branches/x"
        );
    }

    #[test]
    fn test_credentials() {
        let mut repo = RepositoryConfig::default();
        assert!(repo.credentials().is_none());

        repo.username = "tom".to_string();
        repo.password = "secret".to_string();
        let creds = repo.credentials().unwrap();
        assert_eq!(creds.username, "tom");
        assert_eq!(creds.password, "secret");
    }

    #[test]
    fn test_validate_rejects_empty_host() {
        let mut config = Config::default();
        config.repository.host = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_install_command() {
        assert_eq!(Config::default().workspace.install_command, "npm install");
    }
}
