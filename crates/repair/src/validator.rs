use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use remedy_archive::Archive;
use remedy_patch::{parse_opening_tag, serialize_tag};

static ANY_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[A-Za-z][^<>]*>").expect("valid tag-scan pattern"));
static BODY_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<body\b[^<>]*>").expect("valid body pattern"));

/// Roles that count as a landmark for the per-file invariant
const LANDMARK_ROLES: &[&str] = &[
    "main",
    "banner",
    "navigation",
    "contentinfo",
    "complementary",
    "region",
    "search",
    "doc-toc",
    "doc-index",
];

/// One self-healing fix applied by the validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFix {
    pub path: String,
    pub role: String,
}

/// Outcome of the post-remediation invariant pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Files that were healed, with the role assigned
    pub fixes: Vec<ValidationFix>,
    /// Files that could not be healed (e.g. no body element), with reasons
    pub failures: Vec<String>,
}

fn has_landmark_role(content: &str) -> bool {
    ANY_TAG.find_iter(content).any(|m| {
        parse_opening_tag(m.as_str())
            .and_then(|tag| tag.get("role").map(str::to_string))
            .is_some_and(|value| {
                value
                    .split_whitespace()
                    .any(|token| LANDMARK_ROLES.contains(&token))
            })
    })
}

/// Pick a landmark role for a file that still has none, from its filename
fn role_for_filename(path: &str) -> &'static str {
    let name = path.rsplit('/').next().unwrap_or(path).to_ascii_lowercase();
    if name.contains("cover") || name.contains("title") {
        "banner"
    } else if name.contains("toc") || name.contains("nav") {
        "navigation"
    } else if name.contains("acknowledgment") || name.contains("colophon") {
        "contentinfo"
    } else {
        "region"
    }
}

/// Add `role` to the first element inside the body that is not a script
/// and does not already carry a role of its own
fn heal_file(content: &str, role: &str) -> Option<String> {
    let body = BODY_OPEN.find(content)?;
    for m in ANY_TAG.find_iter(&content[body.end()..]) {
        let Some(tag) = parse_opening_tag(m.as_str()) else {
            continue;
        };
        if tag.name == "script" || tag.get("role").is_some() {
            continue;
        }
        let mut attrs = tag.attrs.clone();
        attrs.push(("role".to_string(), role.to_string()));
        let rewritten = serialize_tag(&tag.name, &attrs, tag.self_closing);
        let start = body.end() + m.start();
        let end = body.end() + m.end();
        let mut out = String::with_capacity(content.len() + 16);
        out.push_str(&content[..start]);
        out.push_str(&rewritten);
        out.push_str(&content[end..]);
        return Some(out);
    }
    None
}

/// Final corrective pass: re-derive "does every content file have at least
/// one landmark role" after all other repairs, and assign one (chosen by a
/// filename heuristic) to any file still missing it.
///
/// A file the validator cannot heal is reported, never fatal: already
/// applied, unrelated patches are not rolled back.
pub fn validate_landmarks(archive: &mut Archive) -> Result<ValidationOutcome> {
    let mut outcome = ValidationOutcome::default();

    for path in archive.content_documents() {
        let content = archive.text(&path)?;
        if has_landmark_role(content) {
            continue;
        }
        let role = role_for_filename(&path);
        match heal_file(content, role) {
            Some(rewritten) => {
                archive.set_text(&path, rewritten)?;
                log::info!("Invariant validator assigned role={role} in {path}");
                outcome.fixes.push(ValidationFix {
                    path,
                    role: role.to_string(),
                });
            }
            None => {
                let reason = format!("{path}: no viable insertion point for role={role}");
                log::warn!("Invariant validator could not heal {reason}");
                outcome.failures.push(reason);
            }
        }
    }
    Ok(outcome)
}
