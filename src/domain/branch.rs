use crate::error::{Result, SvnFlowError};

/// Join a URL and a path with exactly one `/` between them
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}

/// Case-insensitive URL comparison, ignoring trailing slashes
pub fn urls_match(a: &str, b: &str) -> bool {
    a.trim_end_matches('/')
        .eq_ignore_ascii_case(b.trim_end_matches('/'))
}

/// Trunk and branches locations of the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchLayout {
    pub trunk_url: String,
    pub branches_url: String,
}

impl BranchLayout {
    pub fn new(trunk_url: impl Into<String>, branches_url: impl Into<String>) -> Self {
        BranchLayout {
            trunk_url: trunk_url.into(),
            branches_url: branches_url.into(),
        }
    }

    pub fn branch_url(&self, name: &str) -> String {
        join_url(&self.branches_url, name)
    }

    pub fn trunk_file_url(&self, relative: &str) -> String {
        join_url(&self.trunk_url, relative)
    }

    pub fn branch_file_url(&self, name: &str, relative: &str) -> String {
        join_url(&self.branch_url(name), relative)
    }

    /// Name of the branch a URL points into, if it lies under the branches URL
    pub fn branch_name_of(&self, url: &str) -> Option<String> {
        let prefix = format!("{}/", self.branches_url.trim_end_matches('/'));
        if url.len() <= prefix.len() || !url[..prefix.len()].eq_ignore_ascii_case(&prefix) {
            return None;
        }

        url[prefix.len()..]
            .split('/')
            .next()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }
}

/// Reject branch names that would not map to a single branches/ child
pub fn validate_branch_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(SvnFlowError::parse("Branch name must not be empty"));
    }
    if trimmed != name || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(SvnFlowError::parse(format!("Invalid branch name '{}'", name)));
    }
    Ok(())
}
