use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use svn_flows::boundary::WorkflowWarning;
use svn_flows::cli::orchestration::{self, WorkflowOutcome};
use svn_flows::cli::{Args, FlowCommand};
use svn_flows::config;
use svn_flows::svn::SvnCliRepository;
use svn_flows::ui;
use svn_flows::workflow::FlowWorkspace;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    // RUST_LOG takes precedence over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::display_error(&format!("Error loading config: {}", e));
            std::process::exit(1);
        }
    };

    let repo = SvnCliRepository::new(config.repository.credentials());
    let mut workspace = FlowWorkspace::new(repo, &config);

    if !args.force {
        if let FlowCommand::CreateBranch { .. } = &args.command {
            // a new checkout wipes the work directory; a missing checkout has nothing to lose
            if let Ok(paths) = workspace.wc_modifications() {
                if !paths.is_empty() {
                    ui::display_warning(&WorkflowWarning::UncommittedChanges { paths });
                }
            }
        }

        if let Some(prompt) = args.command.confirmation_prompt() {
            if !ui::confirm_action(&prompt)? {
                println!("Operation cancelled by user.");
                return Ok(());
            }
        }
    }

    let result = orchestration::execute(&mut workspace, &args.command);

    for warning in workspace.take_warnings() {
        ui::display_warning(&warning);
    }

    match result {
        Ok(outcome) => display_outcome(&outcome),
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }

    Ok(())
}

fn display_outcome(outcome: &WorkflowOutcome) {
    match outcome {
        WorkflowOutcome::WorkingCopy {
            url,
            branch,
            revision,
            modifications,
        } => ui::display_working_copy(url, branch.as_deref(), *revision, modifications),
        WorkflowOutcome::Branches(branches) => ui::display_branches(branches),
        WorkflowOutcome::BranchCreated(name) => {
            ui::display_success(&format!("Created branch '{}' and checked it out", name))
        }
        WorkflowOutcome::BranchRemoved(name) => {
            ui::display_success(&format!("Removed branch '{}'", name))
        }
        WorkflowOutcome::MergeBase { target, revision } => {
            ui::display_merge_base(target, *revision)
        }
        WorkflowOutcome::Revisions {
            location,
            revisions,
        } => ui::display_revisions(location, revisions),
        WorkflowOutcome::Content(content) => print!("{}", content),
        WorkflowOutcome::Committed(Some(revision)) => {
            ui::display_success(&format!("Committed revision {}", revision))
        }
        WorkflowOutcome::Committed(None) => ui::display_status("Nothing to commit"),
        WorkflowOutcome::Merged {
            source,
            preparation,
        } => {
            if let Some(preparation) = preparation {
                ui::display_merge_preparation(preparation);
            }
            ui::display_success(&format!("Recorded merge of {}", source));
        }
    }
}
