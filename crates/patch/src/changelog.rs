use crate::error::clamp_excerpt;
use serde::{Deserialize, Serialize};

const EXCERPT_MAX: usize = 200;

/// Append-only record of one applied patch: before/after excerpts plus the
/// task that caused it. Never mutated or removed; the comparison/reporting
/// collaborator reads these to render diffs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeRecord {
    /// Task the patch belonged to
    pub task_id: String,

    /// Member path that was rewritten
    pub path: String,

    /// Human-readable description of the patch
    pub description: String,

    /// Excerpt of the content before the patch
    pub before_excerpt: String,

    /// Excerpt of the content after the patch
    pub after_excerpt: String,
}

/// Append-only change log for one remediation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeLog {
    records: Vec<ChangeRecord>,
}

impl ChangeLog {
    /// Create an empty change log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record; excerpts are clamped to a bounded length on a
    /// char boundary
    pub fn record(
        &mut self,
        task_id: impl Into<String>,
        path: impl Into<String>,
        description: impl Into<String>,
        before: &str,
        after: &str,
    ) {
        self.records.push(ChangeRecord {
            task_id: task_id.into(),
            path: path.into(),
            description: description.into(),
            before_excerpt: clamp_excerpt(before, EXCERPT_MAX),
            after_excerpt: clamp_excerpt(after, EXCERPT_MAX),
        });
    }

    /// All records, or only those for one task
    #[must_use]
    pub fn changes(&self, task_id: Option<&str>) -> Vec<&ChangeRecord> {
        self.records
            .iter()
            .filter(|record| task_id.is_none_or(|id| record.task_id == id))
            .collect()
    }

    /// Number of recorded patches
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no patches have been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
