use thiserror::Error;

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur in the issue/task data model
#[derive(Error, Debug)]
pub enum ModelError {
    /// An issue entry is missing a required field
    #[error("Invalid issue: {0}")]
    InvalidIssue(String),
}

impl ModelError {
    /// Create an invalid-issue error
    pub fn invalid_issue(msg: impl Into<String>) -> Self {
        Self::InvalidIssue(msg.into())
    }
}
