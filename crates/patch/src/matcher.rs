use crate::attrs::{merge_attributes, parse_opening_tag, serialize_tag, ParsedTag};
use crate::change::{Change, ChangeOp};
use crate::error::{PatchError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static ANY_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[A-Za-z][^<>]*>").expect("valid tag-scan pattern"));

/// Which cascade strategy located the anchor (recorded for diagnostics)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Exact substring match of the anchor
    ExactSubstring,
    /// Attribute-aware tag match with map merging
    AttributeMerge,
    /// Anchor compiled to a whitespace/quote-tolerant pattern
    WhitespaceFlexible,
    /// Element located by its semantic type attribute (epub:type)
    SemanticAttribute,
    /// Same-named tag sharing at least one anchor attribute
    KeyAttribute,
    /// Insert with no anchor: appended at end of member
    AppendToEnd,
}

impl MatchStrategy {
    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExactSubstring => "exact_substring",
            Self::AttributeMerge => "attribute_merge",
            Self::WhitespaceFlexible => "whitespace_flexible",
            Self::SemanticAttribute => "semantic_attribute",
            Self::KeyAttribute => "key_attribute",
            Self::AppendToEnd => "append_to_end",
        }
    }
}

/// Result of a successful change application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// The rewritten member content
    pub content: String,
    /// The strategy that located the anchor
    pub strategy: MatchStrategy,
}

fn splice(content: &str, start: usize, end: usize, replacement: &str) -> String {
    let mut out = String::with_capacity(content.len() + replacement.len());
    out.push_str(&content[..start]);
    out.push_str(replacement);
    out.push_str(&content[end..]);
    out
}

fn apply_at_span(content: &str, start: usize, end: usize, change: &Change) -> String {
    match change.op {
        ChangeOp::Replace => splice(content, start, end, change.replacement().unwrap_or("")),
        ChangeOp::Delete => splice(content, start, end, ""),
        ChangeOp::Insert => {
            let insertion = change.replacement().unwrap_or("");
            splice(content, end, end, insertion)
        }
    }
}

/// All opening tags in `content`, optionally filtered by tag name,
/// as (start, end, parsed) triples in document order.
fn scan_tags(content: &str, name: Option<&str>) -> Vec<(usize, usize, ParsedTag)> {
    ANY_TAG
        .find_iter(content)
        .filter_map(|m| {
            let tag = parse_opening_tag(m.as_str())?;
            if let Some(wanted) = name {
                if tag.name != wanted {
                    return None;
                }
            }
            Some((m.start(), m.end(), tag))
        })
        .collect()
}

/// Strategy 1: exact substring match of the anchor.
fn exact_substring(content: &str, change: &Change) -> Option<String> {
    let anchor = change.anchor()?;
    let start = content.find(anchor)?;
    Some(apply_at_span(content, start, start + anchor.len(), change))
}

/// Strategy 2: attribute-aware tag match.
///
/// Applies when both anchor and replacement are a single opening tag for
/// the same tag name. The matching tag in the file is rewritten by merging
/// attribute maps, so attributes a previous repair added survive.
fn attribute_merge(content: &str, change: &Change) -> Option<String> {
    if change.op != ChangeOp::Replace {
        return None;
    }
    let anchor_tag = parse_opening_tag(change.anchor()?)?;
    let new_tag = parse_opening_tag(change.replacement()?)?;
    if anchor_tag.name != new_tag.name {
        return None;
    }

    let (start, end, file_tag) = scan_tags(content, Some(&anchor_tag.name))
        .into_iter()
        .find(|(_, _, tag)| tag.contains_all(&anchor_tag))?;

    let merged = merge_attributes(&file_tag.attrs, &new_tag.attrs);
    let rewritten = serialize_tag(&file_tag.name, &merged, file_tag.self_closing);
    Some(splice(content, start, end, &rewritten))
}

/// Compile an anchor into a pattern where whitespace runs match any
/// whitespace and either quote style is accepted.
fn flexible_pattern(anchor: &str) -> Option<Regex> {
    let mut pattern = String::with_capacity(anchor.len() * 2);
    let mut in_whitespace = false;
    for ch in anchor.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                pattern.push_str(r"\s+");
                in_whitespace = true;
            }
            continue;
        }
        in_whitespace = false;
        match ch {
            '"' | '\'' => pattern.push_str(r#"["']"#),
            _ => pattern.push_str(&regex::escape(&ch.to_string())),
        }
    }
    Regex::new(&pattern).ok()
}

/// Strategy 3: whitespace-flexible pattern match, tolerating formatting
/// drift between detection and application.
fn whitespace_flexible(content: &str, change: &Change) -> Option<String> {
    let anchor = change.anchor()?;
    let pattern = flexible_pattern(anchor)?;
    let m = pattern.find(content)?;
    Some(apply_at_span(content, m.start(), m.end(), change))
}

fn semantic_tokens(value: &str) -> impl Iterator<Item = &str> {
    value.split_whitespace()
}

/// Strategy 4: semantic-attribute match.
///
/// When the anchor references an `epub:type` value and the replacement only
/// adds a role, locate every element carrying that semantic value anywhere
/// in the file and add the role, skipping elements that already carry one.
/// Zero additions is a success (not an error) when the semantic value and a
/// role already coexist.
fn semantic_attribute(content: &str, change: &Change) -> Option<String> {
    if change.op != ChangeOp::Replace {
        return None;
    }
    let anchor_tag = parse_opening_tag(change.anchor()?)?;
    let new_tag = parse_opening_tag(change.replacement()?)?;
    let semantic = anchor_tag.get("epub:type")?;
    let role = new_tag.get("role")?;
    if anchor_tag.get("role").is_some() {
        return None;
    }

    let mut carriers = 0usize;
    let mut rewritten = Vec::new();
    for (start, end, tag) in scan_tags(content, None) {
        let Some(value) = tag.get("epub:type") else {
            continue;
        };
        if !semantic_tokens(value).any(|t| t == semantic) {
            continue;
        }
        carriers += 1;
        if tag.get("role").is_some() {
            continue;
        }
        let mut attrs = tag.attrs.clone();
        attrs.push(("role".to_string(), role.to_string()));
        rewritten.push((start, end, serialize_tag(&tag.name, &attrs, tag.self_closing)));
    }

    if carriers == 0 {
        return None;
    }
    if rewritten.is_empty() {
        // Semantic value and role already coexist everywhere: no-op success.
        return Some(content.to_string());
    }

    let mut out = content.to_string();
    for (start, end, tag_text) in rewritten.into_iter().rev() {
        out = splice(&out, start, end, &tag_text);
    }
    Some(out)
}

/// Strategy 5: tag-by-key-attribute fallback. Any same-named tag sharing at
/// least one key/value pair with the anchor is rewritten with the merge
/// logic of strategy 2.
fn key_attribute(content: &str, change: &Change) -> Option<String> {
    if change.op != ChangeOp::Replace {
        return None;
    }
    let anchor_tag = parse_opening_tag(change.anchor()?)?;
    let new_tag = parse_opening_tag(change.replacement()?)?;
    if anchor_tag.name != new_tag.name || anchor_tag.attrs.is_empty() {
        return None;
    }

    let (start, end, file_tag) = scan_tags(content, Some(&anchor_tag.name))
        .into_iter()
        .find(|(_, _, tag)| tag.contains_any(&anchor_tag))?;

    let merged = merge_attributes(&file_tag.attrs, &new_tag.attrs);
    let rewritten = serialize_tag(&file_tag.name, &merged, file_tag.self_closing);
    Some(splice(content, start, end, &rewritten))
}

type Strategy = fn(&str, &Change) -> Option<String>;

const CASCADE: &[(MatchStrategy, Strategy)] = &[
    (MatchStrategy::ExactSubstring, exact_substring),
    (MatchStrategy::AttributeMerge, attribute_merge),
    (MatchStrategy::WhitespaceFlexible, whitespace_flexible),
    (MatchStrategy::SemanticAttribute, semantic_attribute),
    (MatchStrategy::KeyAttribute, key_attribute),
];

/// Apply one change to one text member.
///
/// Strategies are tried in cascade order until one succeeds; the winning
/// strategy is recorded for diagnostics. When nothing matches, the error
/// excerpts the anchor so the failure is diagnosable without the file.
pub fn apply_change(content: &str, change: &Change) -> Result<Applied> {
    match change.op {
        ChangeOp::Insert | ChangeOp::Replace if change.replacement().is_none() => {
            return Err(PatchError::EmptyReplacement);
        }
        ChangeOp::Replace | ChangeOp::Delete if change.anchor().is_none() => {
            return Err(PatchError::EmptyAnchor);
        }
        _ => {}
    }
    if change.anchor().is_some_and(|a| a.trim().is_empty()) {
        return Err(PatchError::EmptyAnchor);
    }

    // Insert with no anchor appends at end of member.
    if change.op == ChangeOp::Insert && change.anchor().is_none() {
        let mut out = content.to_string();
        out.push_str(change.replacement().unwrap_or(""));
        return Ok(Applied {
            content: out,
            strategy: MatchStrategy::AppendToEnd,
        });
    }

    for (strategy, matcher) in CASCADE {
        if let Some(rewritten) = matcher(content, change) {
            log::debug!("Anchor located via {}", strategy.as_str());
            return Ok(Applied {
                content: rewritten,
                strategy: *strategy,
            });
        }
    }

    Err(PatchError::no_match(change.anchor().unwrap_or("")))
}
