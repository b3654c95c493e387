use crate::issue::Issue;
use serde::{Deserialize, Serialize};

/// How much automation can resolve an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixType {
    /// Fully automatic: the engine can repair it without human input
    Auto,
    /// One-click: the engine can apply a fix once a human supplies a value
    Quickfix,
    /// Requires human judgment end to end
    Manual,
}

impl FixType {
    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Quickfix => "quickfix",
            Self::Manual => "manual",
        }
    }
}

/// Runtime classification configuration.
///
/// Classification is a static table except for the color-contrast code
/// family, whose fix-type is gated by this toggle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClassifyConfig {
    /// When false, contrast codes are forced to quickfix even though the
    /// contrast fixer could repair them automatically.
    pub contrast_auto_fix: bool,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            contrast_auto_fix: true,
        }
    }
}

/// Codes the engine can repair without human input
const AUTO_FIXABLE: &[&str] = &[
    "META-001",
    "META-002",
    "HEADING-ORDER",
    "heading-order",
    "EPUB-LANDMARKS",
    "LANDMARK-UNIQUE",
    "landmark-unique",
];

/// Codes a human can resolve with a single supplied value
const QUICKFIX: &[&str] = &[
    "image-alt",
    "link-name",
    "label",
    "html-has-lang",
    "ACC-001",
];

/// Cross-detector equivalences: when the mapped code and its canonical
/// equivalent are reported at the same location, the mapped one is a
/// duplicate. Directional: only the left side is ever dropped.
const EQUIVALENT_CODES: &[(&str, &str)] = &[
    ("ACE-META-001", "META-001"),
    ("ACE-META-002", "META-002"),
    ("ACE-LANDMARKS", "EPUB-LANDMARKS"),
];

/// Whether a code belongs to the gated color-contrast family
#[must_use]
fn is_contrast_code(code: &str) -> bool {
    code.eq_ignore_ascii_case("color-contrast") || code.eq_ignore_ascii_case("ACC-CONTRAST")
}

/// Assign a fix-type to a rule code.
///
/// Lookup order: the contrast-family gate, then the auto-fixable set, then
/// the quickfix set, else manual.
#[must_use]
pub fn classify(code: &str, cfg: &ClassifyConfig) -> FixType {
    if is_contrast_code(code) {
        return if cfg.contrast_auto_fix {
            FixType::Auto
        } else {
            FixType::Quickfix
        };
    }
    if AUTO_FIXABLE.contains(&code) {
        return FixType::Auto;
    }
    if QUICKFIX.contains(&code) {
        return FixType::Quickfix;
    }
    FixType::Manual
}

/// Drop structurally invalid issue entries (missing code) rather than
/// failing the run. Returns the surviving issues and the reject count.
#[must_use]
pub fn sanitize(issues: Vec<Issue>) -> (Vec<Issue>, usize) {
    let before = issues.len();
    let kept: Vec<Issue> = issues
        .into_iter()
        .filter(|issue| match issue.validate() {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Dropping issue: {err}");
                false
            }
        })
        .collect();
    let rejected = before - kept.len();
    if rejected > 0 {
        log::info!("Rejected {rejected} malformed issue entries");
    }
    (kept, rejected)
}

/// Collapse cross-detector duplicates.
///
/// An issue whose code appears on the mapped side of the equivalence table
/// is dropped when its canonical twin is present at the same normalized
/// location. Package-wide issues (empty location) match only other
/// package-wide issues.
#[must_use]
pub fn dedup(issues: Vec<Issue>) -> (Vec<Issue>, usize) {
    let canonical_keys: Vec<(String, String)> = issues
        .iter()
        .map(|i| (i.code.clone(), i.normalized_location().to_string()))
        .collect();

    let before = issues.len();
    let kept: Vec<Issue> = issues
        .into_iter()
        .filter(|issue| {
            let Some(&(_, canonical)) = EQUIVALENT_CODES
                .iter()
                .find(|(mapped, _)| *mapped == issue.code)
            else {
                return true;
            };
            let location = issue.normalized_location();
            let has_twin = canonical_keys
                .iter()
                .any(|(code, loc)| code == canonical && loc == location);
            if has_twin {
                log::debug!(
                    "Dropping duplicate {} (canonical {} present at {:?})",
                    issue.code,
                    canonical,
                    location
                );
            }
            !has_twin
        })
        .collect();
    let removed = before - kept.len();
    if removed > 0 {
        log::info!("Deduplicated {removed} cross-detector issue(s)");
    }
    (kept, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{IssueSource, Severity};
    use pretty_assertions::assert_eq;

    fn issue(code: &str, source: IssueSource, location: Option<&str>) -> Issue {
        let mut i = Issue::new(code, source, Severity::Serious, "test");
        i.location = location.map(str::to_string);
        i
    }

    #[test]
    fn classify_auto_quickfix_manual() {
        let cfg = ClassifyConfig::default();
        assert_eq!(classify("META-001", &cfg), FixType::Auto);
        assert_eq!(classify("image-alt", &cfg), FixType::Quickfix);
        assert_eq!(classify("something-unknown", &cfg), FixType::Manual);
    }

    #[test]
    fn contrast_family_follows_the_toggle() {
        let on = ClassifyConfig {
            contrast_auto_fix: true,
        };
        let off = ClassifyConfig {
            contrast_auto_fix: false,
        };
        assert_eq!(classify("color-contrast", &on), FixType::Auto);
        assert_eq!(classify("color-contrast", &off), FixType::Quickfix);
        assert_eq!(classify("COLOR-CONTRAST", &off), FixType::Quickfix);
    }

    #[test]
    fn sanitize_drops_empty_codes() {
        let issues = vec![
            issue("META-001", IssueSource::Epubcheck, None),
            issue("  ", IssueSource::Ace, None),
            issue("", IssueSource::Ace, Some("a.xhtml")),
        ];
        let (kept, rejected) = sanitize(issues);
        assert_eq!(kept.len(), 1);
        assert_eq!(rejected, 2);
    }

    #[test]
    fn dedup_drops_mapped_code_with_canonical_twin() {
        let issues = vec![
            issue("META-002", IssueSource::Epubcheck, Some("content.opf")),
            issue("ACE-META-002", IssueSource::Ace, Some(" content.opf ")),
        ];
        let (kept, removed) = dedup(issues);
        assert_eq!(removed, 1);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].code, "META-002");
    }

    #[test]
    fn dedup_keeps_mapped_code_at_different_location() {
        let issues = vec![
            issue("META-002", IssueSource::Epubcheck, Some("content.opf")),
            issue("ACE-META-002", IssueSource::Ace, Some("other.opf")),
        ];
        let (kept, removed) = dedup(issues);
        assert_eq!(removed, 0);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn dedup_package_wide_matches_only_package_wide() {
        let issues = vec![
            issue("META-001", IssueSource::Epubcheck, Some("content.opf")),
            issue("ACE-META-001", IssueSource::Ace, None),
        ];
        let (kept, removed) = dedup(issues);
        assert_eq!(removed, 0);
        assert_eq!(kept.len(), 2);

        let issues = vec![
            issue("META-001", IssueSource::Epubcheck, None),
            issue("ACE-META-001", IssueSource::Ace, Some("  ")),
        ];
        let (kept, removed) = dedup(issues);
        assert_eq!(removed, 1);
        assert_eq!(kept[0].code, "META-001");
    }

    #[test]
    fn dedup_never_drops_the_canonical_side() {
        let issues = vec![issue("META-002", IssueSource::Epubcheck, None)];
        let (kept, removed) = dedup(issues);
        assert_eq!(removed, 0);
        assert_eq!(kept.len(), 1);
    }
}
