use thiserror::Error;

/// Result type for planner operations
pub type Result<T> = std::result::Result<T, PlanError>;

/// Errors that can occur while building or mutating a plan
#[derive(Error, Debug)]
pub enum PlanError {
    /// A task id was not found in the plan
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    /// A task status transition is not allowed
    #[error("Invalid status transition for task {task_id}: {from} -> {to}")]
    InvalidTransition {
        task_id: String,
        from: String,
        to: String,
    },

    /// Underlying archive access failed
    #[error("Archive error: {0}")]
    Archive(#[from] remedy_archive::ArchiveError),

    /// Underlying patch application failed
    #[error("Patch error: {0}")]
    Patch(#[from] remedy_patch::PatchError),

    /// Underlying structural repair failed
    #[error("Repair error: {0}")]
    Repair(#[from] remedy_repair::RepairError),

    /// No automatic fixer is registered for an issue code
    #[error("No automatic fixer registered for code {0}")]
    NoFixer(String),

    /// A collaborator (detector, store) failed
    #[error("Collaborator error: {0}")]
    Collaborator(String),
}

impl PlanError {
    /// Create an unknown-task error
    pub fn unknown_task(id: impl Into<String>) -> Self {
        Self::UnknownTask(id.into())
    }

    /// Create a collaborator error
    pub fn collaborator(msg: impl Into<String>) -> Self {
        Self::Collaborator(msg.into())
    }
}
