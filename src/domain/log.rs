use std::collections::BTreeMap;

use crate::domain::Revision;

/// How a path was touched by a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Added,
    Modified,
    Deleted,
    Replaced,
}

impl ChangeAction {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'A' => Some(ChangeAction::Added),
            'M' => Some(ChangeAction::Modified),
            'D' => Some(ChangeAction::Deleted),
            'R' => Some(ChangeAction::Replaced),
            _ => None,
        }
    }
}

/// A path changed by a commit, with its copy source if it was copied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedPath {
    pub action: ChangeAction,
    pub copy_from_path: Option<String>,
    pub copy_from_revision: Option<Revision>,
}

impl ChangedPath {
    pub fn new(action: ChangeAction) -> Self {
        ChangedPath {
            action,
            copy_from_path: None,
            copy_from_revision: None,
        }
    }

    pub fn copied_from(action: ChangeAction, path: impl Into<String>, revision: u64) -> Self {
        ChangedPath {
            action,
            copy_from_path: Some(path.into()),
            copy_from_revision: Some(Revision(revision)),
        }
    }

    pub fn is_copy(&self) -> bool {
        self.copy_from_revision.is_some()
    }
}

/// One commit in the history of a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub revision: Revision,
    pub author: String,
    pub message: String,
    pub changed_paths: BTreeMap<String, ChangedPath>,
}

impl LogEntry {
    pub fn new(revision: u64) -> Self {
        LogEntry {
            revision: Revision(revision),
            author: String::new(),
            message: String::new(),
            changed_paths: BTreeMap::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>, change: ChangedPath) -> Self {
        self.changed_paths.insert(path.into(), change);
        self
    }

    /// True if this commit copied `location` itself or one of its ancestors.
    ///
    /// `location` may be a URL or a repository path; changed paths are
    /// matched against its trailing path segments.
    pub fn copies(&self, location: &str) -> bool {
        self.changed_paths
            .iter()
            .any(|(path, change)| change.is_copy() && covers(path, location))
    }

    /// Highest copy-from revision across all changed paths
    pub fn max_copy_from_revision(&self) -> Option<Revision> {
        self.changed_paths
            .values()
            .filter_map(|p| p.copy_from_revision)
            .max()
    }
}

/// `path` names `location` or one of its ancestors
fn covers(path: &str, location: &str) -> bool {
    let path = path.trim_end_matches('/');
    let location = location.trim_end_matches('/');
    if path.is_empty() {
        return true;
    }
    location.match_indices(path).any(|(idx, _)| {
        let rest = &location[idx + path.len()..];
        rest.is_empty() || rest.starts_with('/')
    })
}
