use crate::classify::FixType;
use crate::issue::Issue;
use crate::task::Task;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Grouping keys one record contributes to a tally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TallyKeys {
    pub source: &'static str,
    pub severity: &'static str,
    pub fix_type: &'static str,
}

/// Anything that can be counted by the tally engine.
///
/// Issues and tasks share one tally path so that adjacent pipeline stages
/// are compared on identical dimensions.
pub trait Tallied {
    fn tally_keys(&self) -> TallyKeys;
}

impl Tallied for Task {
    fn tally_keys(&self) -> TallyKeys {
        TallyKeys {
            source: self.source.as_str(),
            severity: self.severity.as_str(),
            fix_type: self.fix_type.as_str(),
        }
    }
}

/// An issue paired with its computed classification. Issues do not store a
/// fix-type, so the classifier's output is attached at tally time.
impl Tallied for (Issue, FixType) {
    fn tally_keys(&self) -> TallyKeys {
        TallyKeys {
            source: self.0.source.as_str(),
            severity: self.0.severity.as_str(),
            fix_type: self.1.as_str(),
        }
    }
}

impl<T: Tallied> Tallied for &T {
    fn tally_keys(&self) -> TallyKeys {
        (*self).tally_keys()
    }
}

/// A point-in-time count of issues or tasks for one named pipeline stage.
///
/// A tally is a snapshot, not a live object: it is computed once from a
/// collection and never updated in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tally {
    /// Stage label ("audit", "plan", ...)
    pub stage: String,

    /// Count per detector source
    pub by_source: BTreeMap<String, usize>,

    /// Count per severity
    pub by_severity: BTreeMap<String, usize>,

    /// Count per fix-type classification
    pub by_fix_type: BTreeMap<String, usize>,

    /// Total record count
    pub grand_total: usize,

    /// False when the per-dimension sums disagree with the grand total,
    /// which indicates a classification bug rather than a data problem
    pub is_valid: bool,

    /// Diagnostics explaining any internal disagreement
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
}

/// Count a collection for one pipeline stage. Pure: no logging side effects
/// beyond diagnostics carried in the returned tally.
pub fn create_tally<T: Tallied>(items: &[T], stage: &str) -> Tally {
    let mut by_source: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_severity: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_fix_type: BTreeMap<String, usize> = BTreeMap::new();

    for item in items {
        let keys = item.tally_keys();
        *by_source.entry(keys.source.to_string()).or_insert(0) += 1;
        *by_severity.entry(keys.severity.to_string()).or_insert(0) += 1;
        *by_fix_type.entry(keys.fix_type.to_string()).or_insert(0) += 1;
    }

    let grand_total = items.len();
    let mut messages = Vec::new();
    for (name, map) in [
        ("source", &by_source),
        ("severity", &by_severity),
        ("fix_type", &by_fix_type),
    ] {
        let sum: usize = map.values().sum();
        if sum != grand_total {
            messages.push(format!(
                "Dimension '{name}' sums to {sum} but grand total is {grand_total} at stage '{stage}'"
            ));
        }
    }

    Tally {
        stage: stage.to_string(),
        by_source,
        by_severity,
        by_fix_type,
        grand_total,
        is_valid: messages.is_empty(),
        messages,
    }
}

/// One dimension whose count changed between two stages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TallyDelta {
    /// Dimension name: "total", "source", "severity" or "fix_type"
    pub dimension: String,

    /// Key within the dimension (empty for "total")
    pub key: String,

    /// Count at the earlier stage
    pub prev: usize,

    /// Count at the later stage
    pub curr: usize,

    /// Signed difference (curr - prev)
    pub diff: i64,
}

/// Outcome of a conservation check between two adjacent stages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationResult {
    /// True when every dimension is conserved (allowing the declared
    /// reduction)
    pub is_valid: bool,

    /// Every dimension whose count differs, with signed difference
    pub deltas: Vec<TallyDelta>,

    /// Human-readable diagnostics
    pub messages: Vec<String>,
}

fn diff_dimension(
    dimension: &str,
    prev: &BTreeMap<String, usize>,
    curr: &BTreeMap<String, usize>,
    deltas: &mut Vec<TallyDelta>,
) {
    let mut keys: Vec<&String> = prev.keys().chain(curr.keys()).collect();
    keys.sort();
    keys.dedup();
    for key in keys {
        let p = prev.get(key).copied().unwrap_or(0);
        let c = curr.get(key).copied().unwrap_or(0);
        if p != c {
            deltas.push(TallyDelta {
                dimension: dimension.to_string(),
                key: key.clone(),
                prev: p,
                curr: c,
                diff: c as i64 - p as i64,
            });
        }
    }
}

/// Conservation-law check between two adjacent stages.
///
/// Every per-dimension count must be equal, unless the transition declares
/// an allowed reduction (deduplication at the audit -> plan boundary), in
/// which case the grand total may drop by exactly that amount and no
/// dimension may grow. Any other discrepancy is reported, never swallowed.
#[must_use]
pub fn validate_transition(prev: &Tally, curr: &Tally, allowed_reduction: usize) -> ValidationResult {
    let mut deltas = Vec::new();
    if prev.grand_total != curr.grand_total {
        deltas.push(TallyDelta {
            dimension: "total".to_string(),
            key: String::new(),
            prev: prev.grand_total,
            curr: curr.grand_total,
            diff: curr.grand_total as i64 - prev.grand_total as i64,
        });
    }
    diff_dimension("source", &prev.by_source, &curr.by_source, &mut deltas);
    diff_dimension("severity", &prev.by_severity, &curr.by_severity, &mut deltas);
    diff_dimension("fix_type", &prev.by_fix_type, &curr.by_fix_type, &mut deltas);

    let total_drop = prev.grand_total as i64 - curr.grand_total as i64;
    let reduction_ok = total_drop == allowed_reduction as i64 && deltas.iter().all(|d| d.diff <= 0);
    let is_valid = deltas.is_empty() || reduction_ok;

    let mut messages = Vec::new();
    if !is_valid {
        for delta in &deltas {
            messages.push(format!(
                "Stage '{}' -> '{}': {} '{}' changed from {} to {} ({:+})",
                prev.stage, curr.stage, delta.dimension, delta.key, delta.prev, delta.curr, delta.diff
            ));
        }
    }

    ValidationResult {
        is_valid,
        deltas,
        messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{IssueSource, Severity};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn classified(code: &str, source: IssueSource, severity: Severity) -> (Issue, FixType) {
        (
            Issue::new(code, source, severity, "test"),
            crate::classify::classify(code, &crate::classify::ClassifyConfig::default()),
        )
    }

    #[test]
    fn tally_counts_every_dimension() {
        let items = vec![
            classified("META-001", IssueSource::Epubcheck, Severity::Serious),
            classified("image-alt", IssueSource::Ace, Severity::Serious),
            classified("weird", IssueSource::Ace, Severity::Minor),
        ];
        let tally = create_tally(&items, "audit");
        assert!(tally.is_valid);
        assert_eq!(tally.grand_total, 3);
        assert_eq!(tally.by_source.get("ace"), Some(&2));
        assert_eq!(tally.by_source.get("epubcheck"), Some(&1));
        assert_eq!(tally.by_severity.get("serious"), Some(&2));
        assert_eq!(tally.by_fix_type.get("auto"), Some(&1));
        assert_eq!(tally.by_fix_type.get("quickfix"), Some(&1));
        assert_eq!(tally.by_fix_type.get("manual"), Some(&1));
    }

    #[test]
    fn empty_collection_is_a_valid_tally() {
        let tally = create_tally(&Vec::<(Issue, FixType)>::new(), "audit");
        assert!(tally.is_valid);
        assert_eq!(tally.grand_total, 0);
        assert!(tally.by_source.is_empty());
    }

    #[test]
    fn identical_tallies_are_conserved() {
        let items = vec![classified("META-001", IssueSource::Epubcheck, Severity::Serious)];
        let a = create_tally(&items, "audit");
        let b = create_tally(&items, "plan");
        let result = validate_transition(&a, &b, 0);
        assert!(result.is_valid);
        assert!(result.deltas.is_empty());
    }

    #[test]
    fn allowed_reduction_passes_exact_drop() {
        let before = vec![
            classified("META-002", IssueSource::Epubcheck, Severity::Serious),
            classified("ACE-META-002", IssueSource::Ace, Severity::Serious),
        ];
        let after = vec![classified("META-002", IssueSource::Epubcheck, Severity::Serious)];
        let a = create_tally(&before, "audit");
        let b = create_tally(&after, "plan");

        assert!(validate_transition(&a, &b, 1).is_valid);
        assert!(!validate_transition(&a, &b, 0).is_valid);
        assert!(!validate_transition(&a, &b, 2).is_valid);
    }

    #[test]
    fn invented_records_are_never_allowed() {
        let before = vec![classified("META-001", IssueSource::Epubcheck, Severity::Serious)];
        let after = vec![
            classified("META-001", IssueSource::Epubcheck, Severity::Serious),
            classified("META-002", IssueSource::Epubcheck, Severity::Serious),
        ];
        let a = create_tally(&before, "audit");
        let b = create_tally(&after, "plan");
        let result = validate_transition(&a, &b, 0);
        assert!(!result.is_valid);
        assert!(result.deltas.iter().any(|d| d.dimension == "total" && d.diff == 1));
        assert!(!result.messages.is_empty());
    }

    #[test]
    fn deltas_report_signed_per_key_differences() {
        let before = vec![
            classified("META-001", IssueSource::Epubcheck, Severity::Serious),
            classified("image-alt", IssueSource::Ace, Severity::Minor),
        ];
        let after = vec![classified("META-001", IssueSource::Epubcheck, Severity::Serious)];
        let a = create_tally(&before, "audit");
        let b = create_tally(&after, "plan");
        let result = validate_transition(&a, &b, 0);
        assert!(!result.is_valid);
        let ace = result
            .deltas
            .iter()
            .find(|d| d.dimension == "source" && d.key == "ace")
            .expect("ace delta");
        assert_eq!(ace.diff, -1);
    }

    proptest! {
        #[test]
        fn proptest_dimension_sums_match_grand_total(
            specs in proptest::collection::vec((0usize..3, 0usize..4, 0usize..3), 0..40)
        ) {
            let sources = [IssueSource::Epubcheck, IssueSource::Ace, IssueSource::Internal];
            let severities = [Severity::Critical, Severity::Serious, Severity::Moderate, Severity::Minor];
            let codes = ["META-001", "image-alt", "weird"];
            let items: Vec<(Issue, FixType)> = specs
                .iter()
                .map(|&(s, sev, c)| classified(codes[c], sources[s], severities[sev]))
                .collect();
            let tally = create_tally(&items, "audit");
            prop_assert!(tally.is_valid);
            prop_assert_eq!(tally.grand_total, items.len());
            let sum: usize = tally.by_source.values().sum();
            prop_assert_eq!(sum, items.len());
            let sum: usize = tally.by_fix_type.values().sum();
            prop_assert_eq!(sum, items.len());
        }

        #[test]
        fn proptest_self_transition_is_always_conserved(
            specs in proptest::collection::vec((0usize..3, 0usize..4, 0usize..3), 0..40)
        ) {
            let sources = [IssueSource::Epubcheck, IssueSource::Ace, IssueSource::Internal];
            let severities = [Severity::Critical, Severity::Serious, Severity::Moderate, Severity::Minor];
            let codes = ["META-001", "image-alt", "weird"];
            let items: Vec<(Issue, FixType)> = specs
                .iter()
                .map(|&(s, sev, c)| classified(codes[c], sources[s], severities[sev]))
                .collect();
            let a = create_tally(&items, "audit");
            let b = create_tally(&items, "plan");
            prop_assert!(validate_transition(&a, &b, 0).is_valid);
        }
    }
}
