use thiserror::Error;

/// Result type for structural repairs
pub type Result<T> = std::result::Result<T, RepairError>;

/// Errors that can occur during structural repair
#[derive(Error, Debug)]
pub enum RepairError {
    /// Underlying archive access failed
    #[error("Archive error: {0}")]
    Archive(#[from] remedy_archive::ArchiveError),

    /// Underlying patch application failed
    #[error("Patch error: {0}")]
    Patch(#[from] remedy_patch::PatchError),

    /// No viable insertion point could be found (e.g. no body element)
    #[error("No insertion point: {0}")]
    NoInsertionPoint(String),

    /// A color value could not be parsed
    #[error("Invalid color: {0}")]
    InvalidColor(String),
}

impl RepairError {
    /// Create a no-insertion-point error
    pub fn no_insertion_point(msg: impl Into<String>) -> Self {
        Self::NoInsertionPoint(msg.into())
    }

    /// Create an invalid-color error
    pub fn invalid_color(value: impl Into<String>) -> Self {
        Self::InvalidColor(value.into())
    }
}
