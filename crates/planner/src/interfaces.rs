use crate::error::Result;
use crate::plan::Plan;
use remedy_archive::Archive;
use remedy_model::Issue;

/// One external detector family (structural linter, accessibility
/// conformance checker).
///
/// Implementations must return issues already shaped to the canonical
/// `Issue` fields; the core never parses a tool-specific output format.
/// Detectors are read-only against the archive, so running several in
/// parallel on separate decoded copies is safe; their results are merged
/// only after all have completed.
pub trait Detector {
    /// Detector family name, used as an audit-trail label
    fn name(&self) -> &str;

    /// Scan the archive and report normalized issues
    fn detect(&self, archive: &Archive) -> Result<Vec<Issue>>;
}

/// Opaque persistence collaborator. The core issues these calls but does
/// not define the storage format.
pub trait PlanStore {
    /// Load the issues recorded for a job
    fn load_job_issues(&self, job_id: &str) -> Result<Vec<Issue>>;

    /// Persist a built (or updated) plan
    fn save_plan(&mut self, job_id: &str, plan: &Plan) -> Result<()>;

    /// Persist the remediated archive bytes
    fn save_archive(&mut self, job_id: &str, bytes: &[u8]) -> Result<()>;
}
