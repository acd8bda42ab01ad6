//! NodeRED branch workflow
//!
//! [FlowWorkspace] sequences repository and local filesystem operations for a
//! NodeRED project: a `flows.json` file plus the optional uibuilder
//! `index.html` / `index.js` / `index.css` assets.
//!
//! The uibuilder directory is not configured; it is the `url` of the
//! uibuilder node in `flows.json`. The workspace remembers the trunk and
//! branch uibuilder paths learned from the last flow it read.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::boundary::WorkflowWarning;
use crate::config::Config;
use crate::domain::asset::uibuilder_path;
use crate::domain::branch::{join_url, validate_branch_name};
use crate::domain::{
    AssetRevisions, BranchLayout, FlowAsset, Revision, RevisionSelector, Target, FLOWS_FILE,
};
use crate::error::{Result, SvnFlowError};
use crate::install::InstallRunner;
use crate::merge_base::resolve_merge_base;
use crate::svn::Repository;

const BRANCH_CREATED_MESSAGE: &str = "Branch created";
const BRANCH_REMOVED_MESSAGE: &str = "No longer needed";

/// Which line is recorded as merged into the working copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeDirection {
    /// The work directory holds a branch; record trunk as merged into it
    TrunkIntoBranch,
    /// The work directory holds trunk; record the named branch as merged into it
    BranchIntoTrunk(String),
}

/// Everything needed to compare a branch with trunk before merging
#[derive(Debug, Clone, PartialEq)]
pub struct MergePreparation {
    /// Latest trunk revision already merged into the branch
    pub merge_base: Revision,
    /// Last-changed revisions of the trunk assets
    pub trunk_revisions: AssetRevisions,
    /// Trunk assets changed after the merge base
    pub changed_assets: Vec<FlowAsset>,
    /// Trunk flows as of the merge base
    pub base_flow: String,
    /// Trunk flows at HEAD
    pub trunk_flow: String,
    /// Branch flows, from the working copy or the repository
    pub branch_flow: String,
}

/// A NodeRED work directory bound to its repository
pub struct FlowWorkspace<R: Repository> {
    repo: R,
    layout: BranchLayout,
    workdir: PathBuf,
    install_command: String,
    trunk_ui_path: Option<String>,
    branch_ui_path: Option<String>,
    warnings: Vec<WorkflowWarning>,
}

impl<R: Repository> FlowWorkspace<R> {
    pub fn new(repo: R, config: &Config) -> Self {
        FlowWorkspace {
            repo,
            layout: config.repository.layout(),
            workdir: config.workspace.workdir.clone(),
            install_command: config.workspace.install_command.clone(),
            trunk_ui_path: None,
            branch_ui_path: None,
            warnings: Vec::new(),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn layout(&self) -> &BranchLayout {
        &self.layout
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn trunk_ui_path(&self) -> Option<&str> {
        self.trunk_ui_path.as_deref()
    }

    pub fn branch_ui_path(&self) -> Option<&str> {
        self.branch_ui_path.as_deref()
    }

    /// Warnings gathered since the last call
    pub fn take_warnings(&mut self) -> Vec<WorkflowWarning> {
        std::mem::take(&mut self.warnings)
    }

    fn warn(&mut self, warning: WorkflowWarning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    fn wc_target(&self) -> Target {
        Target::working_copy(&self.workdir)
    }

    /// URL the work directory is checked out from
    pub fn wc_url(&self) -> Result<String> {
        Ok(self.repo.info(&self.wc_target())?.url)
    }

    /// Branch checked out in the work directory, `None` for trunk
    pub fn current_branch(&self) -> Result<Option<String>> {
        Ok(self.layout.branch_name_of(&self.wc_url()?))
    }

    /// Paths with local modifications, additions, deletions or unversioned files,
    /// relative to the work directory
    pub fn wc_modifications(&self) -> Result<Vec<String>> {
        let entries = self.repo.status(&self.workdir)?;

        Ok(entries
            .into_iter()
            .filter(|e| e.kind.is_dirty())
            .map(|e| {
                let relative = e.path.strip_prefix(&self.workdir).unwrap_or(&e.path);
                let shown = relative.to_string_lossy();
                if shown.is_empty() {
                    ".".to_string()
                } else {
                    shown.into_owned()
                }
            })
            .collect())
    }

    /// Revision of the work directory
    pub fn latest_revision(&self) -> Result<Revision> {
        Ok(self.repo.info(&self.wc_target())?.revision)
    }

    /// Names of all branches
    pub fn branches(&self) -> Result<Vec<String>> {
        self.repo.list(&self.layout.branches_url)
    }

    /// Copy trunk to a new branch and make the work directory a fresh checkout of it.
    ///
    /// Everything in the work directory is deleted first; the configured
    /// install command runs in the new checkout.
    pub fn create_branch(&mut self, name: &str) -> Result<()> {
        validate_branch_name(name)?;
        let branch_url = self.layout.branch_url(name);

        info!(branch = name, "creating branch");
        self.repo
            .remote_copy(&self.layout.trunk_url, &branch_url, BRANCH_CREATED_MESSAGE)?;

        clear_directory(&self.workdir)?;
        self.repo.checkout(&branch_url, &self.workdir)?;
        self.branch_ui_path = None;

        InstallRunner::run(&self.install_command, &self.workdir)
    }

    pub fn remove_branch(&mut self, name: &str) -> Result<()> {
        validate_branch_name(name)?;
        info!(branch = name, "removing branch");
        self.repo
            .remote_delete(&self.layout.branch_url(name), BRANCH_REMOVED_MESSAGE)
    }

    /// Last-changed revisions of the trunk files
    pub fn latest_trunk_revisions(&mut self) -> Result<AssetRevisions> {
        if self.trunk_ui_path.is_none() {
            self.trunk_flow(RevisionSelector::Head)?;
        }
        let base = self.layout.trunk_url.clone();
        let ui_path = self.trunk_ui_path.clone();
        self.asset_revisions(&base, ui_path.as_deref())
    }

    /// Last-changed revisions of a branch's files
    pub fn latest_branch_revisions(&mut self, branch: &str) -> Result<AssetRevisions> {
        validate_branch_name(branch)?;
        if self.branch_ui_path.is_none() {
            self.branch_flow(branch, RevisionSelector::Head)?;
        }
        let base = self.layout.branch_url(branch);
        let ui_path = self.branch_ui_path.clone();
        self.asset_revisions(&base, ui_path.as_deref())
    }

    fn asset_revisions(&mut self, base_url: &str, ui_path: Option<&str>) -> Result<AssetRevisions> {
        let mut revisions = AssetRevisions::default();

        let flows = Target::remote(join_url(base_url, FLOWS_FILE));
        revisions.flows = self.repo.info(&flows)?.last_changed_revision;

        let Some(ui_path) = ui_path else {
            self.warn(WorkflowWarning::NoUiBuilder {
                location: base_url.to_string(),
            });
            return Ok(revisions);
        };

        for asset in FlowAsset::UI {
            let target = Target::remote(join_url(base_url, &asset.relative_path(ui_path)));
            match self.repo.info(&target) {
                Ok(info) => revisions.set(asset, info.last_changed_revision),
                Err(e) if e.is_not_found() => self.warn(WorkflowWarning::MissingUiAsset {
                    asset,
                    location: base_url.to_string(),
                }),
                Err(e) => return Err(e),
            }
        }

        Ok(revisions)
    }

    /// Latest trunk revision merged into the branch.
    ///
    /// With `from_wc` the work directory is queried, otherwise the branch in
    /// the repository.
    pub fn latest_trunk_rev_in_branch(&self, from_wc: bool, branch: &str) -> Result<Revision> {
        let target = if from_wc {
            self.wc_target()
        } else {
            validate_branch_name(branch)?;
            Target::remote(self.layout.branch_url(branch))
        };
        resolve_merge_base(&self.repo, &target, &self.layout.trunk_url)
    }

    /// Content of trunk's flows.json; also records the trunk uibuilder path
    pub fn trunk_flow(&mut self, selection: RevisionSelector) -> Result<String> {
        let url = self.layout.trunk_file_url(FLOWS_FILE);
        let content = self.read_flow(&url, selection)?;
        self.trunk_ui_path = self.ui_path_of(&content);
        Ok(content)
    }

    /// Content of a branch's flows.json; also records the branch uibuilder path
    pub fn branch_flow(&mut self, branch: &str, selection: RevisionSelector) -> Result<String> {
        validate_branch_name(branch)?;
        let url = self.layout.branch_file_url(branch, FLOWS_FILE);
        let content = self.read_flow(&url, selection)?;
        self.branch_ui_path = self.ui_path_of(&content);
        Ok(content)
    }

    /// Content of a trunk UI asset, empty when it does not exist
    pub fn trunk_ui(&mut self, asset: FlowAsset, selection: RevisionSelector) -> Result<String> {
        if !asset.is_ui() {
            return self.trunk_flow(selection);
        }
        if self.trunk_ui_path.is_none() {
            self.trunk_flow(selection)?;
        }
        let base = self.layout.trunk_url.clone();
        let ui_path = self.trunk_ui_path.clone();
        self.read_ui(&base, ui_path.as_deref(), asset, selection)
    }

    /// Content of a branch UI asset, empty when it does not exist
    pub fn branch_ui(
        &mut self,
        branch: &str,
        asset: FlowAsset,
        selection: RevisionSelector,
    ) -> Result<String> {
        if !asset.is_ui() {
            return self.branch_flow(branch, selection);
        }
        if self.branch_ui_path.is_none() {
            self.branch_flow(branch, selection)?;
        }
        let base = self.layout.branch_url(branch);
        let ui_path = self.branch_ui_path.clone();
        self.read_ui(&base, ui_path.as_deref(), asset, selection)
    }

    fn ui_path_of(&self, flow: &str) -> Option<String> {
        match uibuilder_path(flow) {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "flows.json is not a flow array, no uibuilder path");
                None
            }
        }
    }

    fn read_flow(&mut self, url: &str, selection: RevisionSelector) -> Result<String> {
        match selection {
            RevisionSelector::Working => Ok(fs::read_to_string(self.workdir.join(FLOWS_FILE))?),
            RevisionSelector::Head => self.export_text(url, None),
            RevisionSelector::At(revision) => match self.export_text(url, Some(revision)) {
                Err(e) if e.is_not_found() => {
                    self.warn(WorkflowWarning::ExportFellBackToHead {
                        url: url.to_string(),
                        revision,
                    });
                    self.export_text(url, None)
                }
                other => other,
            },
        }
    }

    fn read_ui(
        &mut self,
        base_url: &str,
        ui_path: Option<&str>,
        asset: FlowAsset,
        selection: RevisionSelector,
    ) -> Result<String> {
        let Some(ui_path) = ui_path else {
            self.warn(WorkflowWarning::NoUiBuilder {
                location: base_url.to_string(),
            });
            return Ok(String::new());
        };

        let relative = asset.relative_path(ui_path);
        let result = match selection {
            RevisionSelector::Working => read_local(&self.workdir.join(&relative)),
            RevisionSelector::Head => self.export_text(&join_url(base_url, &relative), None),
            RevisionSelector::At(rev) => {
                self.export_text(&join_url(base_url, &relative), Some(rev))
            }
        };

        match result {
            Err(e) if e.is_not_found() => {
                self.warn(WorkflowWarning::MissingUiAsset {
                    asset,
                    location: base_url.to_string(),
                });
                Ok(String::new())
            }
            other => other,
        }
    }

    fn export_text(&self, url: &str, revision: Option<Revision>) -> Result<String> {
        let dir = tempfile::Builder::new().prefix("nodered-").tempdir()?;
        let path = self.repo.export(url, revision, dir.path())?;
        Ok(fs::read_to_string(path)?)
    }

    /// Overwrite flows.json in the work directory
    pub fn update_flow(&mut self, content: &str) -> Result<()> {
        fs::write(self.workdir.join(FLOWS_FILE), content)?;
        Ok(())
    }

    /// Overwrite a UI asset in the work directory
    pub fn update_ui(&mut self, asset: FlowAsset, content: &str) -> Result<()> {
        if !asset.is_ui() {
            return self.update_flow(content);
        }
        let ui_path = self.wc_ui_path().ok_or_else(|| {
            SvnFlowError::not_found("flows.json in the work directory has no uibuilder node")
        })?;

        let path = self.workdir.join(asset.relative_path(&ui_path));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// The branch uibuilder path, learned from the local flows.json if unknown
    fn wc_ui_path(&mut self) -> Option<String> {
        if self.branch_ui_path.is_none() {
            if let Ok(flow) = fs::read_to_string(self.workdir.join(FLOWS_FILE)) {
                self.branch_ui_path = self.ui_path_of(&flow);
            }
        }
        self.branch_ui_path.clone()
    }

    /// Local UI asset files that exist, provided index.html does
    fn existing_ui_files(&mut self) -> Vec<PathBuf> {
        let Some(ui_path) = self.wc_ui_path() else {
            return Vec::new();
        };
        if !self
            .workdir
            .join(FlowAsset::UiHtml.relative_path(&ui_path))
            .exists()
        {
            return Vec::new();
        }
        FlowAsset::UI
            .iter()
            .map(|asset| self.workdir.join(asset.relative_path(&ui_path)))
            .filter(|path| path.exists())
            .collect()
    }

    /// Commit the work directory and update it.
    ///
    /// Returns the new revision, or `None` when there was nothing to commit.
    pub fn commit(&mut self, message: &str) -> Result<Option<Revision>> {
        let mut paths = vec![self.workdir.join(FLOWS_FILE)];
        paths.extend(self.existing_ui_files());
        paths.push(self.workdir.clone());

        let revision = self.repo.commit(&paths, message)?;
        match revision {
            Some(rev) => info!(%rev, "committed work directory"),
            None => info!("nothing to commit"),
        }

        self.repo.update(&self.workdir)?;
        Ok(revision)
    }

    /// Compute the merge base of a branch and fetch the flows to compare.
    pub fn prepare_merge(&mut self, branch: &str, from_wc: bool) -> Result<MergePreparation> {
        let merge_base = self.latest_trunk_rev_in_branch(from_wc, branch)?;
        let trunk_flow = self.trunk_flow(RevisionSelector::Head)?;
        let trunk_revisions = self.latest_trunk_revisions()?;

        let changed_assets = FlowAsset::ALL
            .into_iter()
            .filter(|asset| trunk_revisions.get(*asset) > merge_base)
            .collect();

        let base_flow = if merge_base.is_none() {
            String::new()
        } else {
            self.trunk_flow(RevisionSelector::At(merge_base))?
        };
        // reading the base snapshot must not replace the HEAD uibuilder path
        self.trunk_ui_path = self.ui_path_of(&trunk_flow);

        let branch_selection = if from_wc {
            RevisionSelector::Working
        } else {
            RevisionSelector::Head
        };
        let branch_flow = self.branch_flow(branch, branch_selection)?;

        Ok(MergePreparation {
            merge_base,
            trunk_revisions,
            changed_assets,
            base_flow,
            trunk_flow,
            branch_flow,
        })
    }

    /// Record a merge in the work directory, keeping the local content.
    ///
    /// Conflicts on flows.json and the UI assets are resolved in favour of
    /// the working copy, then the work directory is updated.
    pub fn merge(&mut self, direction: &MergeDirection) -> Result<()> {
        let source = match direction {
            MergeDirection::TrunkIntoBranch => self.layout.trunk_url.clone(),
            MergeDirection::BranchIntoTrunk(branch) => {
                validate_branch_name(branch)?;
                self.layout.branch_url(branch)
            }
        };

        info!(%source, "recording merge");
        self.repo.merge_record_only(&source, &self.workdir)?;

        self.repo.resolve_mine_full(&self.workdir.join(FLOWS_FILE))?;
        for path in self.existing_ui_files() {
            self.repo.resolve_mine_full(&path)?;
        }

        self.repo.update(&self.workdir)
    }
}

fn read_local(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(SvnFlowError::not_found(format!(
            "{} does not exist",
            path.display()
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Delete everything inside `dir`, creating it if missing
pub fn clear_directory(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        return Ok(());
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if fs::symlink_metadata(&path)?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}
