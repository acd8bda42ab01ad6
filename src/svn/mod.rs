//! Subversion operations abstraction layer
//!
//! This module provides a trait-based abstraction over the version-control
//! backend, allowing the workflow and the merge-base resolver to run against
//! the real `svn` client or an in-memory mock.
//!
//! # Overview
//!
//! The primary abstraction is the [Repository] trait. The concrete
//! implementations are:
//!
//! - [repository::SvnCliRepository]: drives the `svn` command-line client
//! - [mock::MockRepository]: an in-memory repository for tests
//!
//! # Usage
//!
//! Code should depend on the [Repository] trait rather than a concrete
//! implementation.
//!
//! ```rust
//! # use svn_flows::svn::Repository;
//! # use svn_flows::domain::Target;
//! # fn example<R: Repository>(repo: &R) -> Result<(), Box<dyn std::error::Error>> {
//! let target = Target::remote("http://svn.local/svn/repo/branches/feature");
//! let info = repo.info(&target)?;
//! let history = repo.log(&target, true)?;
//! println!("{} has {} commits since it was branched", info.url, history.len());
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod parse;
pub mod repository;

pub use mock::MockRepository;
pub use repository::SvnCliRepository;

use std::path::{Path, PathBuf};

use crate::domain::{LogEntry, MergeInfo, Revision, Target};
use crate::error::Result;

/// What `svn info` reports about a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryInfo {
    pub url: String,
    pub repository_root: String,
    pub revision: Revision,
    pub last_changed_revision: Revision,
}

/// Working-copy state of a single path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Modified,
    Added,
    Deleted,
    Unversioned,
    Other(char),
}

impl StatusKind {
    pub fn from_code(code: char) -> Self {
        match code {
            'M' => StatusKind::Modified,
            'A' => StatusKind::Added,
            'D' => StatusKind::Deleted,
            '?' => StatusKind::Unversioned,
            other => StatusKind::Other(other),
        }
    }

    /// Modified, added, deleted and unversioned paths need a commit
    pub fn is_dirty(&self) -> bool {
        !matches!(self, StatusKind::Other(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub path: PathBuf,
    pub kind: StatusKind,
}

/// Common version-control operation trait
///
/// ## Thread Safety
///
/// All implementors must be `Send + Sync`.
///
/// ## Error Handling
///
/// Implementations report a path that does not exist at the requested
/// revision as [crate::error::SvnFlowError::NotFound] and every other
/// backend failure (network, authentication, protocol) as
/// [crate::error::SvnFlowError::BackendUnavailable]. Nothing is retried.
pub trait Repository: Send + Sync {
    /// URL, repository root and revisions of a target
    fn info(&self, target: &Target) -> Result<RepositoryInfo>;

    /// Status of every path below a working copy (depth infinity)
    fn status(&self, working_copy: &Path) -> Result<Vec<StatusEntry>>;

    /// Names of the immediate children of a directory URL at HEAD
    fn list(&self, url: &str) -> Result<Vec<String>>;

    /// Recorded merge metadata of a target.
    ///
    /// Returns an empty mapping, not an error, when nothing was merged yet.
    fn merge_info(&self, target: &Target) -> Result<MergeInfo>;

    /// History of a target from HEAD down to revision 1, newest first.
    ///
    /// With `stop_on_copy` the walk ends at the commit that created the
    /// target by copying it, which is then the last entry.
    fn log(&self, target: &Target, stop_on_copy: bool) -> Result<Vec<LogEntry>>;

    /// Export the file at `url` into `dest_dir`, returning the written path.
    ///
    /// `revision` is the peg revision; `None` means HEAD.
    fn export(&self, url: &str, revision: Option<Revision>, dest_dir: &Path) -> Result<PathBuf>;

    /// Check out `url` into `path`
    fn checkout(&self, url: &str, path: &Path) -> Result<()>;

    /// Bring a working copy up to HEAD
    fn update(&self, working_copy: &Path) -> Result<()>;

    /// Commit the given paths; `None` when there was nothing to commit
    fn commit(&self, paths: &[PathBuf], message: &str) -> Result<Option<Revision>>;

    /// Server-side copy of `source_url`@HEAD to `dest_url`, creating parents
    fn remote_copy(&self, source_url: &str, dest_url: &str, message: &str) -> Result<()>;

    /// Server-side delete
    fn remote_delete(&self, url: &str, message: &str) -> Result<()>;

    /// Record a merge of `source_url` into the working copy without changing content
    fn merge_record_only(&self, source_url: &str, working_copy: &Path) -> Result<()>;

    /// Resolve conflicts on `path` by keeping the local version
    fn resolve_mine_full(&self, path: &Path) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_kind_codes() {
        assert_eq!(StatusKind::from_code('M'), StatusKind::Modified);
        assert_eq!(StatusKind::from_code('?'), StatusKind::Unversioned);
        assert_eq!(StatusKind::from_code('C'), StatusKind::Other('C'));
    }

    #[test]
    fn test_status_kind_dirty() {
        assert!(StatusKind::Added.is_dirty());
        assert!(StatusKind::Deleted.is_dirty());
        assert!(!StatusKind::Other('!').is_dirty());
    }
}
