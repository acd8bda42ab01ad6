// tests/integration_test.rs
use std::process::Command;

fn svn_flows() -> Command {
    Command::new(env!("CARGO_BIN_EXE_svn-flows"))
}

#[test]
fn test_svn_flows_help() {
    let output = svn_flows()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("svn-flows"));
    assert!(stdout.contains("Branch workflow for NodeRED flows"));
    assert!(stdout.contains("merge-base"));
    assert!(stdout.contains("create-branch"));
}

#[test]
fn test_svn_flows_version() {
    let output = svn_flows()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_command_is_usage_error() {
    let output = svn_flows()
        .arg("publish")
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_missing_config_file_fails() {
    let output = svn_flows()
        .args(["--config", "/nonexistent/svnflows.toml", "branches"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Error loading config"));
}
