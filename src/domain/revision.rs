use std::fmt;
use std::str::FromStr;

use crate::error::SvnFlowError;

/// A repository revision number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Revision(pub u64);

impl Revision {
    /// "No revision"
    pub const NONE: Revision = Revision(0);

    pub fn number(&self) -> u64 {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for Revision {
    fn from(number: u64) -> Self {
        Revision(number)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

impl FromStr for Revision {
    type Err = SvnFlowError;

    /// Accepts `12` as well as `r12`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('r').unwrap_or(trimmed);
        digits
            .parse::<u64>()
            .map(Revision)
            .map_err(|_| SvnFlowError::parse(format!("Invalid revision '{}'", s)))
    }
}

/// Which snapshot of a file to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionSelector {
    /// The file as it currently is in the local working copy
    Working,
    /// The youngest revision in the repository
    Head,
    /// A specific revision
    At(Revision),
}

impl RevisionSelector {
    /// Peg revision suffix for a repository URL (`url@<peg>`)
    pub fn peg(&self) -> Option<String> {
        match self {
            RevisionSelector::Working => None,
            RevisionSelector::Head => Some("HEAD".to_string()),
            RevisionSelector::At(rev) => Some(rev.number().to_string()),
        }
    }
}

impl fmt::Display for RevisionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevisionSelector::Working => write!(f, "working copy"),
            RevisionSelector::Head => write!(f, "HEAD"),
            RevisionSelector::At(rev) => write!(f, "{}", rev),
        }
    }
}

impl FromStr for RevisionSelector {
    type Err = SvnFlowError;

    /// `wc`/`0` select the working copy, `head`/`-1` the youngest revision
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wc" | "working" | "0" => Ok(RevisionSelector::Working),
            "head" | "-1" => Ok(RevisionSelector::Head),
            other => other.parse::<Revision>().map(RevisionSelector::At),
        }
    }
}
