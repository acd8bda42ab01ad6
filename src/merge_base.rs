//! Merge-base resolution
//!
//! Answers "what is the latest trunk revision known to be merged into this
//! branch?". Recorded merge metadata is authoritative once a merge has
//! happened. A fresh branch has none, so the revision it was copied from is
//! read back out of its creation commit instead.
//!
//! The result is recomputed from the backend on every call. For a branch it
//! lies between the branch's copy revision and trunk HEAD.

use tracing::{debug, warn};

use crate::domain::{Revision, Target};
use crate::error::Result;
use crate::svn::Repository;

/// Highest trunk revision merged into `target`.
///
/// Uses the largest end revision of the merge ranges recorded for
/// `trunk_url` (compared case-insensitively). Without such a record it falls
/// back to [first_trunk_revision_in_branch].
///
/// Backend failures propagate unchanged; nothing is retried.
pub fn resolve_merge_base<R: Repository + ?Sized>(
    repo: &R,
    target: &Target,
    trunk_url: &str,
) -> Result<Revision> {
    let merge_info = repo.merge_info(target)?;

    if let Some(rev) = merge_info.latest_merged_revision(trunk_url) {
        debug!(%target, %rev, "merge base from recorded merge info");
        return Ok(rev);
    }

    let rev = first_trunk_revision_in_branch(repo, target)?;
    debug!(%target, %rev, "merge base from branch creation");
    Ok(rev)
}

/// The trunk revision a branch was created from.
///
/// Walks the target's history back to the commit that created it by a copy
/// and takes the highest copy-from revision of that commit's changed paths.
/// If no path carries one, the creation commit's own revision is used.
pub fn first_trunk_revision_in_branch<R: Repository + ?Sized>(
    repo: &R,
    target: &Target,
) -> Result<Revision> {
    let history = repo.log(target, true)?;

    let Some(creation) = history.last() else {
        warn!(%target, "empty history, no merge base");
        return Ok(Revision::NONE);
    };

    Ok(creation
        .max_copy_from_revision()
        .filter(|rev| !rev.is_none())
        .unwrap_or(creation.revision))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChangeAction, ChangedPath, LogEntry, MergeInfo};
    use crate::svn::MockRepository;

    const TRUNK: &str = "http://svn.local/svn/repo/trunk/nodered-live";
    const BRANCH: &str = "http://svn.local/svn/repo/branches/feature";

    #[test]
    fn test_recorded_merge_wins_over_history() {
        let mut repo = MockRepository::new();
        let target = Target::remote(BRANCH);
        repo.set_merge_info(&target, MergeInfo::new().with_range(TRUNK, 10, 15));
        repo.set_log(
            &target,
            vec![LogEntry::new(9).with_path(
                "/branches/feature",
                ChangedPath::copied_from(ChangeAction::Added, "/trunk/nodered-live", 8),
            )],
        );

        assert_eq!(resolve_merge_base(&repo, &target, TRUNK).unwrap(), Revision(15));
    }

    #[test]
    fn test_creation_commit_is_oldest_entry() {
        let mut repo = MockRepository::new();
        let target = Target::remote(BRANCH);
        repo.set_log(
            &target,
            vec![
                LogEntry::new(20).with_path(
                    "/branches/feature/flows.json",
                    ChangedPath::new(ChangeAction::Modified),
                ),
                LogEntry::new(9).with_path(
                    "/branches/feature",
                    ChangedPath::copied_from(ChangeAction::Added, "/trunk/nodered-live", 8),
                ),
            ],
        );

        assert_eq!(first_trunk_revision_in_branch(&repo, &target).unwrap(), Revision(8));
    }

    #[test]
    fn test_empty_history() {
        let repo = MockRepository::new();
        let target = Target::remote(BRANCH);
        assert_eq!(resolve_merge_base(&repo, &target, TRUNK).unwrap(), Revision::NONE);
    }

    #[test]
    fn test_works_through_trait_object() {
        let mut repo = MockRepository::new();
        let target = Target::working_copy("/home/tom/.node-red");
        repo.set_merge_info(&target, MergeInfo::new().with_range(TRUNK, 1, 3));

        let dyn_repo: &dyn Repository = &repo;
        assert_eq!(resolve_merge_base(dyn_repo, &target, TRUNK).unwrap(), Revision(3));
    }
}
