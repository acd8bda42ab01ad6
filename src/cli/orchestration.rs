//! Command execution
//!
//! Maps a parsed [FlowCommand] onto [FlowWorkspace] operations and returns a
//! [WorkflowOutcome] for the caller to display. Keeping display out of this
//! module lets the workflow run programmatically and under test.

use anyhow::{anyhow, Context, Result};

use crate::cli::{FlowCommand, MergeCommand};
use crate::domain::{AssetRevisions, Revision};
use crate::svn::Repository;
use crate::workflow::{FlowWorkspace, MergeDirection, MergePreparation};

/// Result of a successfully executed command
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowOutcome {
    WorkingCopy {
        url: String,
        branch: Option<String>,
        revision: Revision,
        modifications: Vec<String>,
    },
    Branches(Vec<String>),
    BranchCreated(String),
    BranchRemoved(String),
    MergeBase {
        target: String,
        revision: Revision,
    },
    Revisions {
        location: String,
        revisions: AssetRevisions,
    },
    Content(String),
    Committed(Option<Revision>),
    Merged {
        source: String,
        preparation: Option<MergePreparation>,
    },
}

/// Execute one command against a workspace
pub fn execute<R: Repository>(
    workspace: &mut FlowWorkspace<R>,
    command: &FlowCommand,
) -> Result<WorkflowOutcome> {
    let outcome = match command {
        FlowCommand::Info => WorkflowOutcome::WorkingCopy {
            url: workspace.wc_url()?,
            branch: workspace.current_branch()?,
            revision: workspace.latest_revision()?,
            modifications: workspace.wc_modifications()?,
        },

        FlowCommand::Branches => WorkflowOutcome::Branches(workspace.branches()?),

        FlowCommand::CreateBranch { name } => {
            workspace
                .create_branch(name)
                .with_context(|| format!("Failed to create branch '{}'", name))?;
            WorkflowOutcome::BranchCreated(name.clone())
        }

        FlowCommand::RemoveBranch { name } => {
            workspace
                .remove_branch(name)
                .with_context(|| format!("Failed to remove branch '{}'", name))?;
            WorkflowOutcome::BranchRemoved(name.clone())
        }

        FlowCommand::MergeBase { branch } => match branch {
            Some(name) => WorkflowOutcome::MergeBase {
                target: format!("branch '{}'", name),
                revision: workspace.latest_trunk_rev_in_branch(false, name)?,
            },
            None => WorkflowOutcome::MergeBase {
                target: "the work directory".to_string(),
                revision: workspace.latest_trunk_rev_in_branch(true, "")?,
            },
        },

        FlowCommand::Revisions { branch } => match branch {
            Some(name) => WorkflowOutcome::Revisions {
                location: format!("branch '{}'", name),
                revisions: workspace.latest_branch_revisions(name)?,
            },
            None => WorkflowOutcome::Revisions {
                location: "trunk".to_string(),
                revisions: workspace.latest_trunk_revisions()?,
            },
        },

        FlowCommand::Flow { branch, rev } => WorkflowOutcome::Content(match branch {
            Some(name) => workspace.branch_flow(name, *rev)?,
            None => workspace.trunk_flow(*rev)?,
        }),

        FlowCommand::Ui { asset, branch, rev } => WorkflowOutcome::Content(match branch {
            Some(name) => workspace.branch_ui(name, *asset, *rev)?,
            None => workspace.trunk_ui(*asset, *rev)?,
        }),

        FlowCommand::Commit { message } => {
            if message.trim().is_empty() {
                return Err(anyhow!("Commit message must not be empty"));
            }
            WorkflowOutcome::Committed(workspace.commit(message)?)
        }

        FlowCommand::Merge { direction } => match direction {
            MergeCommand::TrunkIntoBranch => {
                let branch = workspace
                    .current_branch()?
                    .ok_or_else(|| anyhow!("The work directory is not a branch checkout"))?;
                let preparation = workspace.prepare_merge(&branch, true)?;
                workspace.merge(&MergeDirection::TrunkIntoBranch)?;
                WorkflowOutcome::Merged {
                    source: "trunk".to_string(),
                    preparation: Some(preparation),
                }
            }
            MergeCommand::BranchIntoTrunk { name } => {
                if workspace.current_branch()?.is_some() {
                    return Err(anyhow!("The work directory is not a trunk checkout"));
                }
                workspace.merge(&MergeDirection::BranchIntoTrunk(name.clone()))?;
                WorkflowOutcome::Merged {
                    source: format!("branch '{}'", name),
                    preparation: None,
                }
            }
        },
    };

    Ok(outcome)
}
