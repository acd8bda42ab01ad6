use std::path::Path;
use std::process::Command;

use tracing::{debug, info};

use crate::error::{Result, SvnFlowError};

/// Runs the dependency-install command in a fresh NodeRED checkout
pub struct InstallRunner;

impl InstallRunner {
    /// Run `command` through the platform shell inside `dir`.
    ///
    /// Output is captured and forwarded to the debug log line by line.
    ///
    /// # Returns
    /// * `Ok(())` if the command exits with code 0
    /// * `Err` if the directory is missing, the shell cannot be started or
    ///   the command returns a non-zero exit code
    pub fn run(command: &str, dir: &Path) -> Result<()> {
        if command.trim().is_empty() {
            debug!("no install command configured");
            return Ok(());
        }

        if !dir.is_dir() {
            return Err(SvnFlowError::install(format!(
                "Work directory not found: {}",
                dir.display()
            )));
        }

        info!(command, dir = %dir.display(), "running install command");

        let output = shell(command)
            .current_dir(dir)
            .output()
            .map_err(|e| SvnFlowError::install(format!("Failed to execute '{}': {}", command, e)))?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            debug!(target: "svn_flows::install", "{}", line);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SvnFlowError::install(format!(
                "'{}' failed with exit code {}\nStderr: {}",
                command,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        Ok(())
    }
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd.exe");
    cmd.arg("/c").arg(command);
    cmd
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory_fails() {
        let result = InstallRunner::run("true", Path::new("/nonexistent/node-red"));
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Work directory not found"));
    }

    #[test]
    fn test_empty_command_is_noop() {
        assert!(InstallRunner::run("  ", Path::new("/nonexistent")).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_runs_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        InstallRunner::run("touch installed.marker", dir.path()).unwrap();
        assert!(dir.path().join("installed.marker").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = InstallRunner::run("echo broken >&2; exit 3", dir.path()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("exit code 3"));
        assert!(msg.contains("broken"));
    }
}
