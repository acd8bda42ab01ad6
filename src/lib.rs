pub mod boundary;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod install;
pub mod merge_base;
pub mod svn;
pub mod ui;
pub mod workflow;

pub use error::{Result, SvnFlowError};
pub use merge_base::resolve_merge_base;
