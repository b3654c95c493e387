use crate::error::{PlanError, Result};
use crate::fixers::{fix_heading_order, fix_missing_language, fix_missing_title};
use crate::plan::{Plan, Resolution};
use remedy_archive::Archive;
use remedy_model::{ClassifyConfig, FixType, TaskStatus};
use remedy_patch::ChangeLog;
use remedy_repair::{ensure_main_landmark, repair_contrast, validate_landmarks};
use std::collections::BTreeMap;

/// Change-log attribution for fixes the invariant validator applies on its
/// own, outside any task group
const VALIDATOR_TASK_ID: &str = "invariant-validator";

/// Configuration surface for one remediation run
#[derive(Debug, Clone)]
pub struct RemediationConfig {
    /// Classification toggles (contrast auto-fix gate)
    pub classify: ClassifyConfig,

    /// Language inserted for a package missing one
    pub default_language: String,

    /// Title inserted for a package missing one
    pub default_title: String,

    /// Files the landmark inserter should try first (callers pass the
    /// locations their detectors flagged)
    pub priority_locations: Vec<String>,

    /// Foreground/background pairs for the contrast fixer; `None` uses the
    /// built-in palette of known-low-contrast colors
    pub contrast_palette: Option<Vec<(String, String)>>,
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            classify: ClassifyConfig::default(),
            default_language: "en".to_string(),
            default_title: "Untitled".to_string(),
            priority_locations: Vec::new(),
            contrast_palette: None,
        }
    }
}

/// What one auto-remediation run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemediationOutcome {
    /// Tasks completed across all groups
    pub completed: usize,

    /// Tasks failed across all groups
    pub failed: usize,

    /// Extra fixes applied by the final invariant-validator pass
    pub validator_fixes: usize,

    /// Files the validator could not heal, with reasons
    pub validator_failures: Vec<String>,
}

fn snapshot_text_members(archive: &Archive) -> BTreeMap<String, String> {
    let paths: Vec<String> = archive.member_paths().map(str::to_string).collect();
    paths
        .into_iter()
        .filter_map(|path| {
            let text = archive.text(&path).ok()?.to_string();
            Some((path, text))
        })
        .collect()
}

fn is_contrast_code(code: &str) -> bool {
    code.eq_ignore_ascii_case("color-contrast") || code.eq_ignore_ascii_case("ACC-CONTRAST")
}

fn dispatch_group(
    code: &str,
    locations: &[String],
    archive: &mut Archive,
    cfg: &RemediationConfig,
) -> Result<Vec<String>> {
    match code {
        "META-001" => fix_missing_language(archive, &cfg.default_language),
        "META-002" => fix_missing_title(archive, &cfg.default_title),
        "HEADING-ORDER" | "heading-order" => fix_heading_order(archive, locations),
        "EPUB-LANDMARKS" | "LANDMARK-UNIQUE" | "landmark-unique" => {
            let mut priority = locations.to_vec();
            priority.extend(cfg.priority_locations.iter().cloned());
            let outcome = ensure_main_landmark(archive, &priority)?;
            Ok(outcome.modified)
        }
        _ if is_contrast_code(code) => {
            let (modified, _) = repair_contrast(archive, cfg.contrast_palette.as_deref())?;
            Ok(modified)
        }
        _ => Err(PlanError::NoFixer(code.to_string())),
    }
}

/// Record one change-log entry per member a group's fix actually rewrote
fn record_modified(
    changelog: &mut ChangeLog,
    task_id: &str,
    description: &str,
    before: &BTreeMap<String, String>,
    archive: &Archive,
    modified: &[String],
) {
    for path in modified {
        let after = archive.text(path).map(str::to_string).unwrap_or_default();
        let empty = String::new();
        let before_text = before.get(path).unwrap_or(&empty);
        if before_text != &after {
            changelog.record(task_id, path.clone(), description, before_text, &after);
        }
    }
}

/// Run every pending auto-fixable task.
///
/// Tasks are grouped by issue code so one structural pass can satisfy many
/// tasks at once, groups are processed in a fixed deterministic order, and
/// a group is atomic: on success every task in it completes with a shared
/// resolved-files list, on failure every task in it fails with the error.
/// After all groups, the invariant validator re-scans the whole archive as
/// a final corrective pass; its extra fixes are counted and logged too.
pub fn run_auto_remediation(
    plan: &mut Plan,
    archive: &mut Archive,
    cfg: &RemediationConfig,
    changelog: &mut ChangeLog,
) -> Result<RemediationOutcome> {
    // Group pending auto tasks by code; BTreeMap keeps the order fixed so
    // output is reproducible given the same input.
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut group_locations: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for task in plan.pending_tasks(FixType::Auto) {
        groups
            .entry(task.issue_code.clone())
            .or_default()
            .push(task.id.clone());
        if let Some(location) = &task.location {
            let locations = group_locations.entry(task.issue_code.clone()).or_default();
            if !locations.contains(location) {
                locations.push(location.clone());
            }
        }
    }

    let mut outcome = RemediationOutcome::default();
    for (code, task_ids) in &groups {
        let locations = group_locations.get(code).cloned().unwrap_or_default();
        for id in task_ids {
            plan.update_status(id, TaskStatus::InProgress, None)?;
        }

        let before = snapshot_text_members(archive);
        match dispatch_group(code, &locations, archive, cfg) {
            Ok(modified) => {
                log::info!(
                    "Fixed {code}: {} task(s), {} file(s) modified",
                    task_ids.len(),
                    modified.len()
                );
                record_modified(
                    changelog,
                    &task_ids[0],
                    &format!("auto-fix {code}"),
                    &before,
                    archive,
                    &modified,
                );
                for id in task_ids {
                    plan.update_status(
                        id,
                        TaskStatus::Completed,
                        Some(Resolution::auto(modified.clone())),
                    )?;
                    outcome.completed += 1;
                }
            }
            Err(err) => {
                log::warn!("Auto-fix for {code} failed: {err}");
                for id in task_ids {
                    plan.update_status(
                        id,
                        TaskStatus::Failed,
                        Some(Resolution::failed(err.to_string())),
                    )?;
                    outcome.failed += 1;
                }
            }
        }
    }

    // Final corrective pass over the whole archive.
    let before = snapshot_text_members(archive);
    let validation = validate_landmarks(archive)?;
    for fix in &validation.fixes {
        let after = archive.text(&fix.path).map(str::to_string).unwrap_or_default();
        let empty = String::new();
        let before_text = before.get(&fix.path).unwrap_or(&empty);
        changelog.record(
            VALIDATOR_TASK_ID,
            fix.path.clone(),
            format!("assign landmark role={}", fix.role),
            before_text,
            &after,
        );
    }
    outcome.validator_fixes = validation.fixes.len();
    outcome.validator_failures = validation.failures;
    if outcome.validator_fixes > 0 {
        log::info!(
            "Invariant validator applied {} additional fix(es)",
            outcome.validator_fixes
        );
    }

    Ok(outcome)
}
