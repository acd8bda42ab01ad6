use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::domain::branch::join_url;
use crate::domain::{LogEntry, MergeInfo, Revision, Target};
use crate::error::{Result, SvnFlowError};
use crate::svn::{Repository, RepositoryInfo, StatusEntry};

/// Mock repository for testing without a Subversion server
///
/// Targets are keyed by the string the svn client would receive
/// (see [Target::as_arg]). Mutating operations are recorded and can be
/// inspected with [MockRepository::calls].
pub struct MockRepository {
    infos: HashMap<String, RepositoryInfo>,
    merge_infos: HashMap<String, MergeInfo>,
    logs: HashMap<String, Vec<LogEntry>>,
    listings: HashMap<String, Vec<String>>,
    files: HashMap<String, BTreeMap<u64, String>>,
    statuses: Vec<StatusEntry>,
    unavailable: HashSet<String>,
    calls: Mutex<Vec<String>>,
    queries: AtomicU64,
    next_revision: AtomicU64,
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        MockRepository {
            infos: HashMap::new(),
            merge_infos: HashMap::new(),
            logs: HashMap::new(),
            listings: HashMap::new(),
            files: HashMap::new(),
            statuses: Vec::new(),
            unavailable: HashSet::new(),
            calls: Mutex::new(Vec::new()),
            queries: AtomicU64::new(0),
            next_revision: AtomicU64::new(100),
        }
    }

    pub fn set_info(&mut self, target: &Target, info: RepositoryInfo) {
        self.infos.insert(target.as_arg(), info);
    }

    pub fn set_merge_info(&mut self, target: &Target, info: MergeInfo) {
        self.merge_infos.insert(target.as_arg(), info);
    }

    /// History of a target, newest entry first
    pub fn set_log(&mut self, target: &Target, entries: Vec<LogEntry>) {
        self.logs.insert(target.as_arg(), entries);
    }

    pub fn set_listing(&mut self, url: impl Into<String>, names: Vec<String>) {
        self.listings.insert(url.into(), names);
    }

    /// Store the content a file URL had as of `revision`
    pub fn add_file(&mut self, url: impl Into<String>, revision: u64, content: impl Into<String>) {
        self.files
            .entry(url.into())
            .or_default()
            .insert(revision, content.into());
    }

    pub fn set_status(&mut self, entries: Vec<StatusEntry>) {
        self.statuses = entries;
    }

    /// Make every query about `target` fail as if the server were unreachable
    pub fn make_unavailable(&mut self, target: &Target) {
        self.unavailable.insert(target.as_arg());
    }

    /// Revision number handed out by the next commit
    pub fn set_next_revision(&self, revision: u64) {
        self.next_revision.store(revision, Ordering::SeqCst);
    }

    /// Mutating operations performed so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of read queries served so far
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn query(&self, key: &str) -> Result<()> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.contains(key) {
            return Err(SvnFlowError::backend(format!(
                "svn: E170013: Unable to connect to a repository at URL '{}'",
                key
            )));
        }
        Ok(())
    }

    fn file_at(&self, url: &str, revision: Option<Revision>) -> Option<(u64, &String)> {
        let versions = self.files.get(url)?;
        let found = match revision {
            Some(rev) => versions.range(..=rev.number()).next_back(),
            None => versions.iter().next_back(),
        };
        found.map(|(rev, content)| (*rev, content))
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn info(&self, target: &Target) -> Result<RepositoryInfo> {
        let key = target.as_arg();
        self.query(&key)?;

        if let Some(info) = self.infos.get(&key) {
            return Ok(info.clone());
        }

        let (rev, _) = self.file_at(&key, None).ok_or_else(|| {
            SvnFlowError::not_found(format!("svn: E170000: '{}' non-existent", key))
        })?;
        Ok(RepositoryInfo {
            url: key.clone(),
            repository_root: String::new(),
            revision: Revision(rev),
            last_changed_revision: Revision(rev),
        })
    }

    fn status(&self, working_copy: &Path) -> Result<Vec<StatusEntry>> {
        self.query(&working_copy.to_string_lossy())?;
        Ok(self.statuses.clone())
    }

    fn list(&self, url: &str) -> Result<Vec<String>> {
        self.query(url)?;
        self.listings
            .get(url)
            .cloned()
            .ok_or_else(|| SvnFlowError::not_found(format!("svn: E170000: '{}' non-existent", url)))
    }

    fn merge_info(&self, target: &Target) -> Result<MergeInfo> {
        let key = target.as_arg();
        self.query(&key)?;
        Ok(self.merge_infos.get(&key).cloned().unwrap_or_default())
    }

    fn log(&self, target: &Target, stop_on_copy: bool) -> Result<Vec<LogEntry>> {
        let key = target.as_arg();
        self.query(&key)?;

        let entries = self.logs.get(&key).cloned().unwrap_or_default();
        if !stop_on_copy {
            return Ok(entries);
        }

        // a working copy is located by the URL recorded with set_info
        let location = self.infos.get(&key).map_or(key.as_str(), |info| info.url.as_str());
        match entries.iter().position(|entry| entry.copies(location)) {
            Some(idx) => Ok(entries[..=idx].to_vec()),
            None => Ok(entries),
        }
    }

    fn export(&self, url: &str, revision: Option<Revision>, dest_dir: &Path) -> Result<PathBuf> {
        self.query(url)?;

        let (_, content) = self.file_at(url, revision).ok_or_else(|| {
            SvnFlowError::not_found(format!("svn: E160013: '{}' path not found", url))
        })?;

        let file_name = url.rsplit('/').next().unwrap_or(url);
        let dest = dest_dir.join(file_name);
        fs::write(&dest, content)?;
        Ok(dest)
    }

    fn checkout(&self, url: &str, path: &Path) -> Result<()> {
        self.record(format!("checkout {} {}", url, path.display()));

        let prefix = join_url(url, "") + "/";
        for file_url in self.files.keys().filter(|f| f.starts_with(&prefix)) {
            if let Some((_, content)) = self.file_at(file_url, None) {
                let dest = path.join(&file_url[prefix.len()..]);
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(dest, content)?;
            }
        }
        Ok(())
    }

    fn update(&self, working_copy: &Path) -> Result<()> {
        self.record(format!("update {}", working_copy.display()));
        Ok(())
    }

    fn commit(&self, paths: &[PathBuf], message: &str) -> Result<Option<Revision>> {
        let listed: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        self.record(format!("commit [{}] {}", listed.join(", "), message));
        Ok(Some(Revision(self.next_revision.fetch_add(1, Ordering::SeqCst))))
    }

    fn remote_copy(&self, source_url: &str, dest_url: &str, message: &str) -> Result<()> {
        self.query(source_url)?;
        self.record(format!("copy {} {} {}", source_url, dest_url, message));
        Ok(())
    }

    fn remote_delete(&self, url: &str, message: &str) -> Result<()> {
        self.query(url)?;
        self.record(format!("delete {} {}", url, message));
        Ok(())
    }

    fn merge_record_only(&self, source_url: &str, working_copy: &Path) -> Result<()> {
        self.record(format!("merge {} {}", source_url, working_copy.display()));
        Ok(())
    }

    fn resolve_mine_full(&self, path: &Path) -> Result<()> {
        self.record(format!("resolve {}", path.display()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChangeAction, ChangedPath};

    const FLOWS: &str = "http://svn.local/repo/trunk/flows.json";

    #[test]
    fn test_mock_export_picks_latest_version_at_revision() {
        let mut repo = MockRepository::new();
        repo.add_file(FLOWS, 3, "v3");
        repo.add_file(FLOWS, 8, "v8");
        let dir = tempfile::tempdir().unwrap();

        let path = repo.export(FLOWS, Some(Revision(5)), dir.path()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "v3");

        let path = repo.export(FLOWS, None, dir.path()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "v8");

        let err = repo.export(FLOWS, Some(Revision(2)), dir.path()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_mock_info_from_files() {
        let mut repo = MockRepository::new();
        repo.add_file(FLOWS, 3, "v3");
        repo.add_file(FLOWS, 8, "v8");

        let info = repo.info(&Target::remote(FLOWS)).unwrap();
        assert_eq!(info.last_changed_revision, Revision(8));

        let err = repo.info(&Target::remote("http://svn.local/repo/trunk/x")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_mock_log_stops_on_copy() {
        let mut repo = MockRepository::new();
        let target = Target::remote("http://svn.local/repo/branches/x");
        repo.set_log(
            &target,
            vec![
                LogEntry::new(12),
                LogEntry::new(9).with_path(
                    "/branches/x",
                    ChangedPath::copied_from(ChangeAction::Added, "/trunk", 8),
                ),
                LogEntry::new(4),
            ],
        );

        assert_eq!(repo.log(&target, true).unwrap().len(), 2);
        assert_eq!(repo.log(&target, false).unwrap().len(), 3);
    }

    #[test]
    fn test_mock_log_ignores_copies_inside_target() {
        let mut repo = MockRepository::new();
        let target = Target::remote("http://svn.local/repo/branches/x");
        repo.set_log(
            &target,
            vec![
                LogEntry::new(14).with_path(
                    "/branches/x/bak.json",
                    ChangedPath::copied_from(ChangeAction::Added, "/branches/x/flows.json", 13),
                ),
                LogEntry::new(9).with_path(
                    "/branches/x",
                    ChangedPath::copied_from(ChangeAction::Added, "/trunk", 8),
                ),
                LogEntry::new(4),
            ],
        );

        let history = repo.log(&target, true).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].revision, Revision(9));
    }

    #[test]
    fn test_mock_unavailable() {
        let mut repo = MockRepository::new();
        let target = Target::remote("http://svn.local/repo/branches/x");
        repo.make_unavailable(&target);

        let err = repo.merge_info(&target).unwrap_err();
        assert!(matches!(err, SvnFlowError::BackendUnavailable(_)));
    }

    #[test]
    fn test_mock_records_calls() {
        let repo = MockRepository::new();
        repo.set_next_revision(7);
        let rev = repo
            .commit(&[PathBuf::from("/wc/flows.json")], "update")
            .unwrap();
        assert_eq!(rev, Some(Revision(7)));
        repo.update(Path::new("/wc")).unwrap();

        assert_eq!(
            repo.calls(),
            vec!["commit [/wc/flows.json] update".to_string(), "update /wc".to_string()]
        );
    }

    #[test]
    fn test_mock_checkout_writes_head_files() {
        let mut repo = MockRepository::new();
        repo.add_file("http://svn.local/repo/branches/x/flows.json", 9, "[]");
        repo.add_file(
            "http://svn.local/repo/branches/x/uibuilder/dash/src/index.html",
            9,
            "<html/>",
        );
        let dir = tempfile::tempdir().unwrap();

        repo.checkout("http://svn.local/repo/branches/x", dir.path())
            .unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("flows.json")).unwrap(), "[]");
        assert!(dir.path().join("uibuilder/dash/src/index.html").exists());
    }
}
