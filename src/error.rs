use thiserror::Error;

/// Unified error type for papertrail operations
#[derive(Error, Debug)]
pub enum PapertrailError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid fragment: {0}")]
    Fragment(String),

    #[error("Version error: {0}")]
    Version(String),

    #[error("Changelog error: {0}")]
    Changelog(String),

    #[error("PR policy violation: {0}")]
    PrPolicy(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in papertrail
pub type Result<T> = std::result::Result<T, PapertrailError>;

impl PapertrailError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        PapertrailError::Config(msg.into())
    }

    /// Create a fragment error with context
    pub fn fragment(msg: impl Into<String>) -> Self {
        PapertrailError::Fragment(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        PapertrailError::Version(msg.into())
    }

    /// Create a changelog error with context
    pub fn changelog(msg: impl Into<String>) -> Self {
        PapertrailError::Changelog(msg.into())
    }

    /// Create a PR policy error with context
    pub fn pr_policy(msg: impl Into<String>) -> Self {
        PapertrailError::PrPolicy(msg.into())
    }
}
