use crate::classify::FixType;
use crate::issue::{Issue, IssueSource, Severity};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Remediation priority, derived from issue severity via a fixed mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Map a severity to its remediation priority
    #[must_use]
    pub const fn from_severity(severity: Severity) -> Self {
        match severity {
            Severity::Critical => Self::Critical,
            Severity::Serious => Self::High,
            Severity::Moderate => Self::Medium,
            Severity::Minor => Self::Low,
        }
    }

    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Task lifecycle state.
///
/// The lifecycle is strictly forward: nothing ever transitions back to
/// `Pending`, and terminal states accept no further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Skipped,
    Failed,
}

impl TaskStatus {
    /// Whether moving from `self` to `next` is a legal lifecycle step
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InProgress)
                | (Self::Pending, Self::Skipped)
                | (Self::InProgress, Self::Completed)
                | (Self::InProgress, Self::Failed)
        )
    }

    /// Whether this state accepts no further transitions
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Skipped | Self::Failed)
    }

    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// How a completed task was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionMethod {
    Auto,
    Manual,
    Verified,
}

/// Deterministic, content-addressed task id.
///
/// The same issue always maps to the same task id across plan regenerations:
/// no counters, no run-order sensitivity.
#[must_use]
pub fn task_id(job_id: &str, code: &str, location: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(job_id.as_bytes());
    hasher.update(b"\n");
    hasher.update(code.as_bytes());
    hasher.update(b"\n");
    hasher.update(location.unwrap_or("").trim().as_bytes());
    let digest = hasher.finalize();
    let mut id = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        id.push_str(&format!("{byte:02x}"));
    }
    id
}

/// One planned remediation unit, derived 1:1 from a surviving issue.
///
/// Tasks are created once per plan build, mutated only through the planner's
/// `update_status`, and never deleted: skipped and failed tasks remain as a
/// historical record with their original issue context attached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    /// Content-addressed id (hash of job + code + location)
    pub id: String,

    /// Rule code of the originating issue
    pub issue_code: String,

    /// Detector that reported the originating issue
    pub source: IssueSource,

    /// Severity of the originating issue
    pub severity: Severity,

    /// Message of the originating issue
    pub message: String,

    /// Member path the issue was reported against, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Current lifecycle state
    pub status: TaskStatus,

    /// Remediation priority (fixed mapping from severity)
    pub priority: Priority,

    /// How much automation can resolve this task
    pub fix_type: FixType,

    /// Where the fix actually landed, recorded on completion. May differ
    /// from `location` when a structural fix touched a different member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_location: Option<String>,

    /// All members modified by the fix, recorded on completion
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resolved_files: Vec<String>,

    /// How the completion happened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_method: Option<CompletionMethod>,

    /// Human-readable reason, recorded on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl Task {
    /// Derive a pending task from a surviving issue
    #[must_use]
    pub fn from_issue(job_id: &str, issue: &Issue, fix_type: FixType) -> Self {
        Self {
            id: task_id(job_id, &issue.code, issue.location.as_deref()),
            issue_code: issue.code.clone(),
            source: issue.source,
            severity: issue.severity,
            message: issue.message.clone(),
            location: issue.location.clone(),
            status: TaskStatus::Pending,
            priority: Priority::from_severity(issue.severity),
            fix_type,
            resolved_location: None,
            resolved_files: Vec::new(),
            completion_method: None,
            failure_reason: None,
        }
    }
}
