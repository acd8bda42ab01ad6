//! Command-line surface
//!
//! Argument definitions live here; [orchestration] maps a parsed command onto
//! the [crate::workflow::FlowWorkspace] operations.

pub mod orchestration;

use clap::{ArgAction, Parser, Subcommand};

use crate::domain::{FlowAsset, RevisionSelector};

#[derive(Parser, Debug)]
#[command(
    name = "svn-flows",
    version,
    about = "Branch workflow for NodeRED flows stored in Subversion"
)]
pub struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    pub config: Option<String>,

    #[arg(
        short,
        long,
        global = true,
        action = ArgAction::Count,
        help = "More log output (-v info, -vv debug)"
    )]
    pub verbose: u8,

    #[arg(short, long, global = true, help = "Skip confirmation prompts")]
    pub force: bool,

    #[command(subcommand)]
    pub command: FlowCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum FlowCommand {
    /// Show URL, revision and local modifications of the work directory
    Info,

    /// List all branches
    Branches,

    /// Branch trunk and check the branch out into the work directory
    CreateBranch { name: String },

    /// Delete a branch from the repository
    RemoveBranch { name: String },

    /// Show the latest trunk revision merged into a branch
    MergeBase {
        #[arg(short, long, help = "Branch in the repository (default: the work directory)")]
        branch: Option<String>,
    },

    /// Show the last-changed revision of flows.json and the UI assets
    Revisions {
        #[arg(short, long, help = "Branch to inspect (default: trunk)")]
        branch: Option<String>,
    },

    /// Print flows.json
    Flow {
        #[arg(short, long, help = "Branch to read (default: trunk)")]
        branch: Option<String>,

        #[arg(short, long, default_value = "head", help = "wc, head or a revision number")]
        rev: RevisionSelector,
    },

    /// Print a UI asset (html, js or css)
    Ui {
        asset: FlowAsset,

        #[arg(short, long, help = "Branch to read (default: trunk)")]
        branch: Option<String>,

        #[arg(short, long, default_value = "head", help = "wc, head or a revision number")]
        rev: RevisionSelector,
    },

    /// Commit the work directory
    Commit {
        #[arg(short, long)]
        message: String,
    },

    /// Record a merge in the work directory, keeping local content
    Merge {
        #[command(subcommand)]
        direction: MergeCommand,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum MergeCommand {
    /// The work directory holds a branch; record trunk as merged into it
    TrunkIntoBranch,

    /// The work directory holds trunk; record a branch as merged into it
    BranchIntoTrunk { name: String },
}

impl FlowCommand {
    /// Commands that delete or overwrite data and ask before running
    pub fn confirmation_prompt(&self) -> Option<String> {
        match self {
            FlowCommand::CreateBranch { name } => Some(format!(
                "Create branch '{}' and replace the work directory with its checkout?",
                name
            )),
            FlowCommand::RemoveBranch { name } => {
                Some(format!("Delete branch '{}' from the repository?", name))
            }
            FlowCommand::Merge {
                direction: MergeCommand::TrunkIntoBranch,
            } => Some("Record trunk as merged into the work directory?".to_string()),
            FlowCommand::Merge {
                direction: MergeCommand::BranchIntoTrunk { name },
            } => Some(format!(
                "Record branch '{}' as merged into the work directory?",
                name
            )),
            _ => None,
        }
    }
}
