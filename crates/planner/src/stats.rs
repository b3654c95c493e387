use remedy_model::Task;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate counts over the authoritative task list.
///
/// Always derived, never incremented ad hoc: `recompute` is the only writer
/// and runs after every plan mutation, so the stats can never drift from
/// the tasks they describe.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanStats {
    /// Total task count
    pub total: usize,

    /// Count per lifecycle status
    pub by_status: BTreeMap<String, usize>,

    /// Count per fix-type
    pub by_fix_type: BTreeMap<String, usize>,

    /// Count per detector source
    pub by_source: BTreeMap<String, usize>,

    /// Count per severity
    pub by_severity: BTreeMap<String, usize>,
}

impl PlanStats {
    /// Derive fresh stats from the full task list
    #[must_use]
    pub fn recompute(tasks: &[Task]) -> Self {
        let mut stats = Self {
            total: tasks.len(),
            ..Self::default()
        };
        for task in tasks {
            *stats
                .by_status
                .entry(task.status.as_str().to_string())
                .or_insert(0) += 1;
            *stats
                .by_fix_type
                .entry(task.fix_type.as_str().to_string())
                .or_insert(0) += 1;
            *stats
                .by_source
                .entry(task.source.as_str().to_string())
                .or_insert(0) += 1;
            *stats
                .by_severity
                .entry(task.severity.as_str().to_string())
                .or_insert(0) += 1;
        }
        stats
    }

    /// Count of tasks currently in one status
    #[must_use]
    pub fn status_count(&self, status: &str) -> usize {
        self.by_status.get(status).copied().unwrap_or(0)
    }
}
