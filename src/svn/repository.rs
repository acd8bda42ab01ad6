use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::debug;

use crate::domain::{LogEntry, MergeInfo, Revision, RevisionSelector, Target};
use crate::error::{Result, SvnFlowError};
use crate::svn::{parse, RepositoryInfo, StatusEntry};

/// Credentials passed to every svn invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// [super::Repository] implementation driving the `svn` command-line client
pub struct SvnCliRepository {
    program: PathBuf,
    credentials: Option<Credentials>,
}

impl SvnCliRepository {
    /// Use `svn` from `PATH`
    pub fn new(credentials: Option<Credentials>) -> Self {
        SvnCliRepository {
            program: PathBuf::from("svn"),
            credentials,
        }
    }

    /// Use a specific svn executable
    pub fn with_program(program: impl Into<PathBuf>, credentials: Option<Credentials>) -> Self {
        SvnCliRepository {
            program: program.into(),
            credentials,
        }
    }

    fn command(&self, subcommand: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.env("LC_ALL", "C")
            .arg(subcommand)
            .arg("--non-interactive")
            .arg("--no-auth-cache");

        if let Some(creds) = &self.credentials {
            if !creds.username.is_empty() {
                cmd.arg("--username").arg(&creds.username);
            }
            if !creds.password.is_empty() {
                cmd.arg("--password").arg(&creds.password);
            }
        }

        cmd
    }

    fn output(&self, subcommand: &str, mut cmd: Command) -> Result<Output> {
        debug!(subcommand, "running svn");
        cmd.output().map_err(|e| {
            SvnFlowError::backend(format!(
                "Cannot run {} {}: {}",
                self.program.display(),
                subcommand,
                e
            ))
        })
    }

    /// Run a command and return stdout, mapping failures through the error classifier
    fn run(&self, subcommand: &str, cmd: Command) -> Result<String> {
        let output = self.output(subcommand, cmd)?;
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return Err(parse::classify_error(&format!("svn {}", subcommand), &stderr));
        }

        if !stderr.trim().is_empty() {
            debug!(subcommand, stderr = %stderr.trim(), "svn reported warnings");
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// `url@peg`; a working-copy selection leaves the URL unpegged
fn pegged(url: &str, selection: RevisionSelector) -> String {
    match selection.peg() {
        Some(peg) => format!("{}@{}", url, peg),
        None => url.to_string(),
    }
}

impl super::Repository for SvnCliRepository {
    fn info(&self, target: &Target) -> Result<RepositoryInfo> {
        let mut cmd = self.command("info");
        cmd.arg(target.as_arg());
        let stdout = self.run("info", cmd)?;
        parse::parse_info(&stdout)
    }

    fn status(&self, working_copy: &Path) -> Result<Vec<StatusEntry>> {
        let mut cmd = self.command("status");
        cmd.arg("--depth").arg("infinity").arg(working_copy);
        let stdout = self.run("status", cmd)?;
        Ok(parse::parse_status(&stdout))
    }

    fn list(&self, url: &str) -> Result<Vec<String>> {
        let mut cmd = self.command("list");
        cmd.arg("--depth").arg("immediates").arg(pegged(url, RevisionSelector::Head));
        let stdout = self.run("list", cmd)?;
        Ok(parse::parse_list(&stdout))
    }

    fn merge_info(&self, target: &Target) -> Result<MergeInfo> {
        let root = self.info(target)?.repository_root;

        let mut cmd = self.command("propget");
        cmd.arg("svn:mergeinfo").arg(target.as_arg());
        let output = self.output("propget", cmd)?;
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            if parse::is_missing_property(&stderr) {
                return Ok(MergeInfo::new());
            }
            return Err(parse::classify_error("svn propget svn:mergeinfo", &stderr));
        }

        MergeInfo::from_property(&String::from_utf8_lossy(&output.stdout), &root)
    }

    fn log(&self, target: &Target, stop_on_copy: bool) -> Result<Vec<LogEntry>> {
        let mut cmd = self.command("log");
        cmd.arg("--verbose").arg("--revision").arg("HEAD:1");
        if stop_on_copy {
            cmd.arg("--stop-on-copy");
        }
        match target {
            Target::WorkingCopy(path) => cmd.arg(path),
            Target::Remote(url) => cmd.arg(pegged(url, RevisionSelector::Head)),
        };
        let stdout = self.run("log", cmd)?;
        parse::parse_log(&stdout)
    }

    fn export(&self, url: &str, revision: Option<Revision>, dest_dir: &Path) -> Result<PathBuf> {
        let file_name = url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| SvnFlowError::parse(format!("Cannot export '{}': no file name", url)))?;
        let dest = dest_dir.join(file_name);

        let mut cmd = self.command("export");
        let selection = revision.map_or(RevisionSelector::Head, RevisionSelector::At);
        cmd.arg("--force").arg(pegged(url, selection)).arg(&dest);
        self.run("export", cmd)?;
        Ok(dest)
    }

    fn checkout(&self, url: &str, path: &Path) -> Result<()> {
        let mut cmd = self.command("checkout");
        cmd.arg(pegged(url, RevisionSelector::Head)).arg(path);
        self.run("checkout", cmd)?;
        Ok(())
    }

    fn update(&self, working_copy: &Path) -> Result<()> {
        let mut cmd = self.command("update");
        cmd.arg(working_copy);
        self.run("update", cmd)?;
        Ok(())
    }

    fn commit(&self, paths: &[PathBuf], message: &str) -> Result<Option<Revision>> {
        let mut cmd = self.command("commit");
        cmd.arg("--message").arg(message).args(paths);
        let stdout = self.run("commit", cmd)?;
        Ok(parse::parse_committed_revision(&stdout))
    }

    fn remote_copy(&self, source_url: &str, dest_url: &str, message: &str) -> Result<()> {
        let mut cmd = self.command("copy");
        cmd.arg("--parents")
            .arg("--message")
            .arg(message)
            .arg(pegged(source_url, RevisionSelector::Head))
            .arg(dest_url);
        self.run("copy", cmd)?;
        Ok(())
    }

    fn remote_delete(&self, url: &str, message: &str) -> Result<()> {
        let mut cmd = self.command("delete");
        cmd.arg("--message").arg(message).arg(url);
        self.run("delete", cmd)?;
        Ok(())
    }

    fn merge_record_only(&self, source_url: &str, working_copy: &Path) -> Result<()> {
        let mut cmd = self.command("merge");
        cmd.arg("--record-only")
            .arg("--allow-mixed-revisions")
            .arg(source_url)
            .arg(working_copy);
        self.run("merge", cmd)?;
        Ok(())
    }

    fn resolve_mine_full(&self, path: &Path) -> Result<()> {
        let mut cmd = self.command("resolve");
        cmd.arg("--accept").arg("mine-full").arg(path);
        self.run("resolve", cmd)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svn::Repository;

    #[test]
    fn test_pegged_urls() {
        assert_eq!(
            pegged("http://x/flows.json", RevisionSelector::Head),
            "http://x/flows.json@HEAD"
        );
        assert_eq!(
            pegged("http://x/flows.json", RevisionSelector::At(Revision(12))),
            "http://x/flows.json@12"
        );
        assert_eq!(
            pegged("http://x/flows.json", RevisionSelector::Working),
            "http://x/flows.json"
        );
    }

    #[test]
    fn test_missing_program_is_backend_unavailable() {
        let repo = SvnCliRepository::with_program("/nonexistent/bin/svn", None);
        let err = repo.info(&Target::remote("http://svn.local/trunk")).unwrap_err();
        assert!(matches!(err, SvnFlowError::BackendUnavailable(_)));
    }

    #[test]
    fn test_export_requires_file_name() {
        let repo = SvnCliRepository::with_program("/nonexistent/bin/svn", None);
        let err = repo.export("", None, Path::new("/tmp")).unwrap_err();
        assert!(matches!(err, SvnFlowError::Parse(_)));
    }
}
