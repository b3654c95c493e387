use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};

/// Which external detector family produced an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSource {
    /// Structural linter (package/markup validity)
    Epubcheck,
    /// Accessibility conformance checker
    Ace,
    /// The engine's own invariant validator
    Internal,
}

impl IssueSource {
    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Epubcheck => "epubcheck",
            Self::Ace => "ace",
            Self::Internal => "internal",
        }
    }
}

/// Severity of a detected issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Serious,
    Moderate,
    Minor,
}

impl Severity {
    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Serious => "serious",
            Self::Moderate => "moderate",
            Self::Minor => "minor",
        }
    }
}

/// One detected accessibility defect, normalized from an external detector.
///
/// Issues are produced fresh per audit run and are immutable once created;
/// a new audit supersedes them, nothing mutates them in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Issue {
    /// Rule identifier (e.g. "META-001", "color-contrast")
    pub code: String,

    /// Detector that produced this issue
    pub source: IssueSource,

    /// Severity as reported by the detector
    pub severity: Severity,

    /// Human-readable description
    pub message: String,

    /// Archive member path, or `None` for package-wide issues
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// WCAG success criteria this issue maps to (e.g. "1.4.3")
    #[serde(default)]
    pub wcag_criteria: Vec<String>,

    /// Coarse category (metadata, structure, color, ...)
    #[serde(default)]
    pub category: String,
}

impl Issue {
    /// Create a new issue
    pub fn new(
        code: impl Into<String>,
        source: IssueSource,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            source,
            severity,
            message: message.into(),
            location: None,
            wcag_criteria: Vec::new(),
            category: String::new(),
        }
    }

    /// Builder: set the member path this issue was reported against
    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder: add a WCAG criterion
    #[must_use]
    pub fn wcag(mut self, criterion: impl Into<String>) -> Self {
        self.wcag_criteria.push(criterion.into());
        self
    }

    /// Builder: set the category
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Check that this issue carries the fields the pipeline requires
    pub fn validate(&self) -> Result<()> {
        if self.code.trim().is_empty() {
            return Err(ModelError::invalid_issue(format!(
                "empty code from {} at {:?}",
                self.source.as_str(),
                self.location
            )));
        }
        Ok(())
    }

    /// Location normalized for duplicate comparison: trimmed, with an empty
    /// or missing location treated as package-wide.
    #[must_use]
    pub fn normalized_location(&self) -> &str {
        self.location.as_deref().map(str::trim).unwrap_or("")
    }

    /// Whether this issue applies to the package as a whole rather than a
    /// single member.
    #[must_use]
    pub fn is_package_wide(&self) -> bool {
        self.normalized_location().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builder_sets_location_and_wcag() {
        let issue = Issue::new("META-001", IssueSource::Epubcheck, Severity::Serious, "m")
            .location("OEBPS/content.opf")
            .wcag("3.1.1")
            .category("metadata");
        assert_eq!(issue.location.as_deref(), Some("OEBPS/content.opf"));
        assert_eq!(issue.wcag_criteria, vec!["3.1.1".to_string()]);
        assert_eq!(issue.category, "metadata");
    }

    #[test]
    fn normalized_location_trims_whitespace() {
        let issue = Issue::new("x", IssueSource::Ace, Severity::Minor, "m")
            .location("  OEBPS/ch1.xhtml ");
        assert_eq!(issue.normalized_location(), "OEBPS/ch1.xhtml");
        assert!(!issue.is_package_wide());
    }

    #[test]
    fn missing_and_blank_locations_are_package_wide() {
        let a = Issue::new("x", IssueSource::Ace, Severity::Minor, "m");
        let b = Issue::new("x", IssueSource::Ace, Severity::Minor, "m").location("   ");
        assert!(a.is_package_wide());
        assert!(b.is_package_wide());
        assert_eq!(a.normalized_location(), b.normalized_location());
    }

    #[test]
    fn severity_round_trips_through_serde() {
        let json = serde_json::to_string(&Severity::Serious).unwrap();
        assert_eq!(json, "\"serious\"");
        let back: Severity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Severity::Serious);
    }
}
