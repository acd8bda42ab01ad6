use std::fmt;

use crate::domain::{FlowAsset, Revision};

/// Non-fatal conditions met while running a workflow step.
/// These are reported to the user but do not stop the operation.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowWarning {
    /// The working copy has local changes a branch switch would discard
    UncommittedChanges { paths: Vec<String> },
    /// A uibuilder asset does not exist in the repository
    MissingUiAsset { asset: FlowAsset, location: String },
    /// A file did not exist at the requested revision and HEAD was exported instead
    ExportFellBackToHead { url: String, revision: Revision },
    /// flows.json declares no uibuilder node, so UI assets are skipped
    NoUiBuilder { location: String },
}

impl fmt::Display for WorkflowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowWarning::UncommittedChanges { paths } => {
                let shown: Vec<&str> = paths.iter().take(5).map(String::as_str).collect();
                write!(
                    f,
                    "{} uncommitted change(s) in the work directory: {}",
                    paths.len(),
                    shown.join(", ")
                )?;
                if paths.len() > shown.len() {
                    write!(f, ", ...")?;
                }
                Ok(())
            }
            WorkflowWarning::MissingUiAsset { asset, location } => {
                write!(f, "UI asset {} not found in {}", asset, location)
            }
            WorkflowWarning::ExportFellBackToHead { url, revision } => {
                write!(f, "'{}' did not exist at {}, used HEAD instead", url, revision)
            }
            WorkflowWarning::NoUiBuilder { location } => {
                write!(f, "No uibuilder node in the flows of {}", location)
            }
        }
    }
}
