use crate::error::{PlanError, Result};
use remedy_archive::Archive;
use remedy_patch::{apply_change, Change};
use remedy_repair::normalize_headings;

/// Locate the opening `<metadata ...>` tag of the package document
fn metadata_open_tag(opf: &str) -> Option<&str> {
    let start = opf.find("<metadata")?;
    let end = opf[start..].find('>')? + start + 1;
    Some(&opf[start..end])
}

/// META-001: insert a `dc:language` element into the package metadata.
///
/// Idempotent: a package that already declares any language is left alone
/// and the fix reports success with no modified files.
pub fn fix_missing_language(archive: &mut Archive, language: &str) -> Result<Vec<String>> {
    let opf_path = archive.opf_path()?;
    let content = archive.text(&opf_path)?;
    if content.contains("<dc:language") {
        log::debug!("{opf_path} already declares a language");
        return Ok(Vec::new());
    }
    let anchor = metadata_open_tag(content)
        .ok_or_else(|| PlanError::collaborator(format!("{opf_path} has no metadata element")))?
        .to_string();
    let insertion = format!("\n    <dc:language>{language}</dc:language>");
    let applied = apply_change(content, &Change::insert_after(anchor, insertion))?;
    archive.set_text(&opf_path, applied.content)?;
    Ok(vec![opf_path])
}

/// META-002: insert or fill the `dc:title` element.
///
/// Idempotent: a non-empty title is left alone.
pub fn fix_missing_title(archive: &mut Archive, default_title: &str) -> Result<Vec<String>> {
    let opf_path = archive.opf_path()?;
    let content = archive.text(&opf_path)?;

    if let Some(start) = content.find("<dc:title") {
        let rest = &content[start..];
        if let Some(open_end) = rest.find('>') {
            if rest.as_bytes()[open_end - 1] == b'/' {
                // Self-closing empty title.
                let anchor = &rest[..=open_end];
                let replacement = format!("<dc:title>{default_title}</dc:title>");
                let applied = apply_change(content, &Change::replace(anchor, replacement))?;
                archive.set_text(&opf_path, applied.content)?;
                return Ok(vec![opf_path]);
            }
            if let Some(close) = rest.find("</dc:title>") {
                let text = rest[open_end + 1..close].trim();
                if !text.is_empty() {
                    log::debug!("{opf_path} already has a title");
                    return Ok(Vec::new());
                }
                let anchor = &rest[..close + "</dc:title>".len()];
                let replacement = format!("<dc:title>{default_title}</dc:title>");
                let applied = apply_change(content, &Change::replace(anchor, replacement))?;
                archive.set_text(&opf_path, applied.content)?;
                return Ok(vec![opf_path]);
            }
        }
    }

    let anchor = metadata_open_tag(content)
        .ok_or_else(|| PlanError::collaborator(format!("{opf_path} has no metadata element")))?
        .to_string();
    let insertion = format!("\n    <dc:title>{default_title}</dc:title>");
    let applied = apply_change(content, &Change::insert_after(anchor, insertion))?;
    archive.set_text(&opf_path, applied.content)?;
    Ok(vec![opf_path])
}

/// HEADING-ORDER: normalize the heading hierarchy of the flagged files, or
/// of every content document when no location was reported.
pub fn fix_heading_order(archive: &mut Archive, locations: &[String]) -> Result<Vec<String>> {
    let documents = archive.content_documents();
    let targets: Vec<String> = if locations.is_empty() {
        documents
    } else {
        locations
            .iter()
            .filter(|l| documents.contains(l))
            .cloned()
            .collect()
    };

    let mut modified = Vec::new();
    for path in targets {
        let content = archive.text(&path)?;
        if let Some(rewritten) = normalize_headings(content) {
            archive.set_text(&path, rewritten)?;
            modified.push(path);
        }
    }
    Ok(modified)
}
