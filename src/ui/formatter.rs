//! Pure formatting functions for UI output.
//!
//! This module contains all display/formatting logic separated from user interaction.

use console::style;

use crate::boundary::WorkflowWarning;
use crate::domain::{AssetRevisions, FlowAsset, Revision};
use crate::workflow::MergePreparation;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Print a non-fatal workflow warning.
pub fn display_warning(warning: &WorkflowWarning) {
    eprintln!("{} {}", style("⚠ Warning:").yellow().bold(), warning);
}

/// Display the state of the work directory.
pub fn display_working_copy(
    url: &str,
    branch: Option<&str>,
    revision: Revision,
    modifications: &[String],
) {
    println!("{}", style("Work directory").bold());
    println!("  URL:      {}", url);
    println!("  Line:     {}", branch.unwrap_or("trunk"));
    println!("  Revision: {}", revision);

    if modifications.is_empty() {
        println!("  No local modifications");
    } else {
        let heading = format!("{} local modification(s):", modifications.len());
        println!("  {}", style(heading).underlined());
        for path in modifications {
            println!("    {}", path);
        }
    }
}

/// List branch names.
pub fn display_branches(branches: &[String]) {
    if branches.is_empty() {
        println!("No branches");
        return;
    }
    println!("{}", style("Branches:").bold());
    for branch in branches {
        println!("  - {}", branch);
    }
}

/// Format a revision column entry; missing assets show as "-".
pub fn format_revision(revision: Revision) -> String {
    if revision.is_none() {
        "-".to_string()
    } else {
        revision.to_string()
    }
}

/// Display the last-changed revision of every asset.
pub fn display_revisions(location: &str, revisions: &AssetRevisions) {
    println!("{}", style(format!("Latest revisions in {}", location)).bold());
    for asset in FlowAsset::ALL {
        println!("  {:<11} {}", asset.file_name(), format_revision(revisions.get(asset)));
    }
}

/// Display the merge base of a branch.
pub fn display_merge_base(target: &str, revision: Revision) {
    println!(
        "Latest trunk revision merged into {}: {}",
        style(target).cyan(),
        style(format_revision(revision)).green()
    );
}

/// Summarise what trunk changed since the merge base.
pub fn display_merge_preparation(preparation: &MergePreparation) {
    println!(
        "\n{} {}",
        style("Merge base:").bold(),
        format_revision(preparation.merge_base)
    );

    if preparation.changed_assets.is_empty() {
        println!("  Trunk has no changes since the merge base");
        return;
    }

    println!("  Trunk changed since the merge base:");
    for asset in &preparation.changed_assets {
        println!(
            "    {:<11} {}",
            asset.file_name(),
            format_revision(preparation.trunk_revisions.get(*asset))
        );
    }
}
