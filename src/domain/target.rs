use std::fmt;
use std::path::{Path, PathBuf};

/// Something the backend can be queried about: a local checkout or a URL
///
/// Merge-base resolution behaves the same for both variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    WorkingCopy(PathBuf),
    Remote(String),
}

impl Target {
    pub fn working_copy(path: impl AsRef<Path>) -> Self {
        Target::WorkingCopy(path.as_ref().to_path_buf())
    }

    pub fn remote(url: impl Into<String>) -> Self {
        Target::Remote(url.into())
    }

    /// The argument handed to the svn client
    pub fn as_arg(&self) -> String {
        match self {
            Target::WorkingCopy(path) => path.to_string_lossy().into_owned(),
            Target::Remote(url) => url.clone(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::WorkingCopy(path) => write!(f, "working copy {}", path.display()),
            Target::Remote(url) => write!(f, "{}", url),
        }
    }
}
