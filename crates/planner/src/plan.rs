use crate::error::{PlanError, Result};
use crate::stats::PlanStats;
use remedy_model::{
    classify, create_tally, dedup, sanitize, validate_transition, ClassifyConfig,
    CompletionMethod, FixType, Issue, Tally, Task, TaskStatus, ValidationResult,
};
use serde::{Deserialize, Serialize};

/// What a completing (or failing) status update carries
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Members the fix actually touched; empty means "default to the
    /// task's own location"
    pub files: Vec<String>,

    /// How the completion happened (defaults to auto)
    pub method: Option<CompletionMethod>,

    /// Human-readable reason, for failed tasks
    pub failure_reason: Option<String>,
}

impl Resolution {
    /// Resolution for an automatic fix that modified the given members
    #[must_use]
    pub fn auto(files: Vec<String>) -> Self {
        Self {
            files,
            method: Some(CompletionMethod::Auto),
            failure_reason: None,
        }
    }

    /// Resolution for a failure
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            files: Vec::new(),
            method: None,
            failure_reason: Some(reason.into()),
        }
    }
}

/// The remediation plan for one job: the authoritative task list plus the
/// stage tallies proving conservation from audit to plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Job identifier (part of every content-addressed task id)
    pub job_id: String,

    /// The authoritative task list; never shrinks, tasks are never deleted
    pub tasks: Vec<Task>,

    /// Tally of the sanitized issue list before deduplication
    pub audit_tally: Tally,

    /// Tally of the planned task list
    pub plan_tally: Tally,

    /// Conservation check between the two tallies
    pub conservation: ValidationResult,

    /// Cross-detector duplicates removed at the audit -> plan boundary
    pub duplicates_removed: usize,

    /// Repeated reports of one rule at one location, collapsed into the
    /// single task their shared content-addressed id defines
    pub repeats_merged: usize,

    /// Malformed issue entries dropped at the detector boundary
    pub rejected: usize,

    /// Derived aggregate stats; recomputed after every mutation
    pub stats: PlanStats,
}

impl Plan {
    /// Build a plan from raw detector output.
    ///
    /// Sanitizes, tallies the audit stage, deduplicates, derives one task
    /// per surviving issue in priority order (stable sort, ties keep the
    /// original issue order), tallies the plan stage, and runs the
    /// conservation check allowing exactly the dedup-plus-merge reduction.
    /// Any other gap is logged issue-by-issue with full context.
    ///
    /// Issues sharing a code and normalized location map to the same
    /// content-addressed id and are therefore one remediation unit: the
    /// first report keeps the task, later repeats are counted in
    /// `repeats_merged`.
    #[must_use]
    pub fn build(job_id: impl Into<String>, raw_issues: Vec<Issue>, cfg: &ClassifyConfig) -> Self {
        let job_id = job_id.into();
        let (issues, rejected) = sanitize(raw_issues);

        let classified: Vec<(Issue, FixType)> = issues
            .iter()
            .map(|issue| (issue.clone(), classify(&issue.code, cfg)))
            .collect();
        let audit_tally = create_tally(&classified, "audit");

        let (survivors, duplicates_removed) = dedup(issues);

        let mut tasks: Vec<Task> = Vec::with_capacity(survivors.len());
        let mut repeats_merged = 0usize;
        for issue in &survivors {
            let task = Task::from_issue(&job_id, issue, classify(&issue.code, cfg));
            if tasks.iter().any(|t| t.id == task.id) {
                log::debug!(
                    "Merging repeated report of {} at {:?} into task {}",
                    issue.code,
                    issue.location,
                    task.id
                );
                repeats_merged += 1;
                continue;
            }
            tasks.push(task);
        }
        tasks.sort_by_key(|task| task.priority);

        let plan_tally = create_tally(&tasks, "plan");
        let conservation = validate_transition(
            &audit_tally,
            &plan_tally,
            duplicates_removed + repeats_merged,
        );
        if !conservation.is_valid {
            for message in &conservation.messages {
                log::warn!("Conservation violation: {message}");
            }
            // Per-issue context so an operator can diagnose exactly which
            // issue vanished.
            for issue in &survivors {
                if !tasks.iter().any(|t| t.issue_code == issue.code) {
                    log::warn!(
                        "Issue lost between audit and plan: code={} source={} location={:?}",
                        issue.code,
                        issue.source.as_str(),
                        issue.location
                    );
                }
            }
        }

        let stats = PlanStats::recompute(&tasks);
        log::info!(
            "Plan built for job {job_id}: {} tasks ({} duplicates removed, {} repeats merged, {} rejected)",
            tasks.len(),
            duplicates_removed,
            repeats_merged,
            rejected
        );
        Self {
            job_id,
            tasks,
            audit_tally,
            plan_tally,
            conservation,
            duplicates_removed,
            repeats_merged,
            rejected,
            stats,
        }
    }

    /// Look up a task by id
    #[must_use]
    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Pending tasks of one fix-type, in plan (priority) order
    #[must_use]
    pub fn pending_tasks(&self, fix_type: FixType) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending && t.fix_type == fix_type)
            .collect()
    }

    /// The single mutator for task state.
    ///
    /// Enforces the linear lifecycle, records where a completed fix landed
    /// (the task's own location when it is among the modified files, else
    /// the first modified file, else the original location), and recomputes
    /// the derived stats afterwards.
    pub fn update_status(
        &mut self,
        task_id: &str,
        status: TaskStatus,
        resolution: Option<Resolution>,
    ) -> Result<&Task> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| PlanError::unknown_task(task_id))?;

        if !task.status.can_transition_to(status) {
            return Err(PlanError::InvalidTransition {
                task_id: task_id.to_string(),
                from: task.status.as_str().to_string(),
                to: status.as_str().to_string(),
            });
        }
        task.status = status;

        match status {
            TaskStatus::Completed => {
                let resolution = resolution.unwrap_or_default();
                let files = if resolution.files.is_empty() {
                    task.location.iter().cloned().collect()
                } else {
                    resolution.files
                };
                task.resolved_location = task
                    .location
                    .as_ref()
                    .filter(|loc| files.contains(loc))
                    .cloned()
                    .or_else(|| files.first().cloned());
                task.resolved_files = files;
                task.completion_method = Some(resolution.method.unwrap_or(CompletionMethod::Auto));
            }
            TaskStatus::Failed => {
                task.failure_reason = resolution
                    .and_then(|r| r.failure_reason)
                    .or_else(|| Some("unspecified failure".to_string()));
            }
            _ => {}
        }

        self.stats = PlanStats::recompute(&self.tasks);
        let task_id = task_id.to_string();
        Ok(self
            .tasks
            .iter()
            .find(|t| t.id == task_id)
            .expect("task present after mutation"))
    }
}
