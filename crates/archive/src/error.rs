use thiserror::Error;

/// Result type for archive operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Errors that can occur while reading or writing the packaged document
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Underlying container could not be read or written
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A member path does not exist in the archive
    #[error("Member not found: {0}")]
    MemberNotFound(String),

    /// A text operation was attempted on a binary member
    #[error("Member is not text: {0}")]
    NotText(String),

    /// The package document (OPF) could not be located
    #[error("Package document not found: {0}")]
    MissingOpf(String),
}

impl ArchiveError {
    /// Create a member-not-found error
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::MemberNotFound(path.into())
    }

    /// Create a not-text error
    pub fn not_text(path: impl Into<String>) -> Self {
        Self::NotText(path.into())
    }

    /// Create a missing-OPF error
    pub fn missing_opf(msg: impl Into<String>) -> Self {
        Self::MissingOpf(msg.into())
    }
}
