use thiserror::Error;

/// Unified error type for svn-flows operations
#[derive(Error, Debug)]
pub enum SvnFlowError {
    #[error("Version control backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Install command failed: {0}")]
    Install(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Convenience type alias for Results in svn-flows
pub type Result<T> = std::result::Result<T, SvnFlowError>;

impl SvnFlowError {
    /// Create a backend error with context
    pub fn backend(msg: impl Into<String>) -> Self {
        SvnFlowError::BackendUnavailable(msg.into())
    }

    /// Create a not-found error with context
    pub fn not_found(msg: impl Into<String>) -> Self {
        SvnFlowError::NotFound(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        SvnFlowError::Config(msg.into())
    }

    /// Create a parse error with context
    pub fn parse(msg: impl Into<String>) -> Self {
        SvnFlowError::Parse(msg.into())
    }

    /// Create an install error with context
    pub fn install(msg: impl Into<String>) -> Self {
        SvnFlowError::Install(msg.into())
    }

    /// True when the queried path does not exist at the requested revision.
    ///
    /// Collaborators treat this as "no data" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SvnFlowError::NotFound(_))
    }
}
