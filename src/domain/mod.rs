//! Domain logic - repository concepts independent of the svn client

pub mod asset;
pub mod branch;
pub mod log;
pub mod merge_info;
pub mod revision;
pub mod target;

pub use asset::{AssetRevisions, FlowAsset, FLOWS_FILE};
pub use branch::BranchLayout;
pub use log::{ChangeAction, ChangedPath, LogEntry};
pub use merge_info::{MergeInfo, MergeRange};
pub use revision::{Revision, RevisionSelector};
pub use target::Target;
