use crate::error::{RepairError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use remedy_archive::Archive;
use remedy_patch::{parse_opening_tag, serialize_tag};

static ANY_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[A-Za-z][^<>]*>").expect("valid tag-scan pattern"));
static BODY_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<body\b[^<>]*>").expect("valid body pattern"));
static BODY_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</body\s*>").expect("valid body-close pattern"));

/// Outcome of a landmark insertion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LandmarkOutcome {
    /// Members modified by this run (at most one)
    pub modified: Vec<String>,
    /// True when a pre-existing landmark made the run a no-op
    pub already_present: bool,
}

fn role_tokens(value: &str) -> impl Iterator<Item = &str> {
    value.split_whitespace()
}

/// Whether one content document already declares the primary landmark:
/// a `role="main"`, a native `<main>` element, or a semantic bodymatter
/// marker.
#[must_use]
pub fn has_main_landmark(content: &str) -> bool {
    for m in ANY_TAG.find_iter(content) {
        let Some(tag) = parse_opening_tag(m.as_str()) else {
            continue;
        };
        if tag.name == "main" {
            return true;
        }
        if tag
            .get("role")
            .is_some_and(|v| role_tokens(v).any(|t| t == "main"))
        {
            return true;
        }
        if tag
            .get("epub:type")
            .is_some_and(|v| role_tokens(v).any(|t| t == "bodymatter"))
        {
            return true;
        }
    }
    false
}

/// Add `role="main"` to the first candidate tag in `content`, trying tag
/// names in the given priority order. Candidates already carrying a role
/// are skipped.
fn add_role_to_candidate(content: &str, candidates: &[&str]) -> Option<String> {
    for name in candidates {
        for m in ANY_TAG.find_iter(content) {
            let Some(tag) = parse_opening_tag(m.as_str()) else {
                continue;
            };
            if tag.name != *name || tag.get("role").is_some() {
                continue;
            }
            let mut attrs = tag.attrs.clone();
            attrs.push(("role".to_string(), "main".to_string()));
            let rewritten = serialize_tag(&tag.name, &attrs, tag.self_closing);
            let mut out = String::with_capacity(content.len() + 16);
            out.push_str(&content[..m.start()]);
            out.push_str(&rewritten);
            out.push_str(&content[m.end()..]);
            return Some(out);
        }
    }
    None
}

/// Wrap the entire body content in a new `<main role="main">` element
fn wrap_body_in_main(content: &str) -> Option<String> {
    let open = BODY_OPEN.find(content)?;
    let close = BODY_CLOSE.find_at(content, open.end())?;
    let mut out = String::with_capacity(content.len() + 32);
    out.push_str(&content[..open.end()]);
    out.push_str("<main role=\"main\">");
    out.push_str(&content[open.end()..close.start()]);
    out.push_str("</main>");
    out.push_str(&content[close.start()..]);
    Some(out)
}

/// Enforce "the whole document collection has exactly one primary content
/// landmark".
///
/// First pass scans every content file for an existing landmark and stops
/// if one is found. Otherwise the second pass tries, per file in
/// priority-location-first order, to add `role="main"` to the first of
/// {`<main>`, `<section>`, `<article>`} lacking a role; when no file offers
/// a candidate, the body content of the first file with a body is wrapped
/// in a new main element. Exactly one landmark is added per run.
pub fn ensure_main_landmark(
    archive: &mut Archive,
    priority_locations: &[String],
) -> Result<LandmarkOutcome> {
    let documents = archive.content_documents();

    for path in &documents {
        if has_main_landmark(archive.text(path)?) {
            log::debug!("Primary landmark already present in {path}");
            return Ok(LandmarkOutcome {
                modified: Vec::new(),
                already_present: true,
            });
        }
    }

    // Priority locations first, remaining documents in deterministic order.
    let mut ordered: Vec<&String> = priority_locations
        .iter()
        .filter(|p| documents.contains(p))
        .collect();
    for path in &documents {
        if !ordered.iter().any(|p| *p == path) {
            ordered.push(path);
        }
    }

    for path in &ordered {
        let content = archive.text(path)?;
        if let Some(rewritten) = add_role_to_candidate(content, &["main", "section", "article"]) {
            archive.set_text(path, rewritten)?;
            log::info!("Added primary landmark role in {path}");
            return Ok(LandmarkOutcome {
                modified: vec![(*path).clone()],
                already_present: false,
            });
        }
    }

    for path in &ordered {
        let content = archive.text(path)?;
        if let Some(rewritten) = wrap_body_in_main(content) {
            archive.set_text(path, rewritten)?;
            log::info!("Wrapped body content of {path} in a main landmark");
            return Ok(LandmarkOutcome {
                modified: vec![(*path).clone()],
                already_present: false,
            });
        }
    }

    Err(RepairError::no_insertion_point(
        "no content document offers a landmark candidate or a body element",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn archive_with(docs: &[(&str, &str)]) -> Archive {
        let mut archive = Archive::new();
        for (path, content) in docs {
            archive.insert_text(*path, *content);
        }
        archive
    }

    #[test]
    fn existing_landmark_short_circuits_the_run() {
        let mut archive = archive_with(&[
            ("OEBPS/ch1.xhtml", "<html><body><section>a</section></body></html>"),
            (
                "OEBPS/ch2.xhtml",
                r#"<html><body><div role="main">b</div></body></html>"#,
            ),
        ]);
        let outcome = ensure_main_landmark(&mut archive, &[]).unwrap();
        assert!(outcome.already_present);
        assert!(outcome.modified.is_empty());
        // Neither file changed.
        assert_eq!(
            archive.text("OEBPS/ch1.xhtml").unwrap(),
            "<html><body><section>a</section></body></html>"
        );
    }

    #[test]
    fn native_main_element_counts_as_landmark() {
        let mut archive = archive_with(&[(
            "OEBPS/ch1.xhtml",
            "<html><body><main>content</main></body></html>",
        )]);
        let outcome = ensure_main_landmark(&mut archive, &[]).unwrap();
        assert!(outcome.already_present);
    }

    #[test]
    fn exactly_one_landmark_across_many_files() {
        let mut archive = archive_with(&[
            ("OEBPS/a.xhtml", "<html><body><section>a</section></body></html>"),
            ("OEBPS/b.xhtml", "<html><body><section>b</section></body></html>"),
        ]);
        let outcome = ensure_main_landmark(&mut archive, &[]).unwrap();
        assert_eq!(outcome.modified, vec!["OEBPS/a.xhtml".to_string()]);
        assert!(archive
            .text("OEBPS/a.xhtml")
            .unwrap()
            .contains(r#"<section role="main">"#));
        assert!(!archive.text("OEBPS/b.xhtml").unwrap().contains("role"));

        // Second run changes nothing.
        let second = ensure_main_landmark(&mut archive, &[]).unwrap();
        assert!(second.already_present);
        assert!(second.modified.is_empty());
    }

    #[test]
    fn priority_locations_bias_the_target_file() {
        let mut archive = archive_with(&[
            ("OEBPS/a.xhtml", "<html><body><section>a</section></body></html>"),
            ("OEBPS/b.xhtml", "<html><body><article>b</article></body></html>"),
        ]);
        let priority = vec!["OEBPS/b.xhtml".to_string()];
        let outcome = ensure_main_landmark(&mut archive, &priority).unwrap();
        assert_eq!(outcome.modified, vec!["OEBPS/b.xhtml".to_string()]);
        assert!(archive
            .text("OEBPS/b.xhtml")
            .unwrap()
            .contains(r#"<article role="main">"#));
    }

    #[test]
    fn candidates_with_roles_are_skipped() {
        let mut archive = archive_with(&[(
            "OEBPS/a.xhtml",
            r#"<html><body><section role="doc-preface">a</section><article>b</article></body></html>"#,
        )]);
        let outcome = ensure_main_landmark(&mut archive, &[]).unwrap();
        assert_eq!(outcome.modified.len(), 1);
        assert!(archive
            .text("OEBPS/a.xhtml")
            .unwrap()
            .contains(r#"<article role="main">"#));
    }

    #[test]
    fn body_wrap_fallback_when_no_candidate_exists() {
        let mut archive = archive_with(&[(
            "OEBPS/a.xhtml",
            r#"<html><body class="plain"><p>just text</p></body></html>"#,
        )]);
        let outcome = ensure_main_landmark(&mut archive, &[]).unwrap();
        assert_eq!(outcome.modified, vec!["OEBPS/a.xhtml".to_string()]);
        assert_eq!(
            archive.text("OEBPS/a.xhtml").unwrap(),
            r#"<html><body class="plain"><main role="main"><p>just text</p></main></body></html>"#
        );
    }

    #[test]
    fn no_body_anywhere_is_an_error() {
        let mut archive = archive_with(&[("OEBPS/a.xhtml", "<p>fragment only</p>")]);
        let err = ensure_main_landmark(&mut archive, &[]).unwrap_err();
        assert!(matches!(err, RepairError::NoInsertionPoint(_)));
    }
}
