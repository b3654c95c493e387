use once_cell::sync::Lazy;
use regex::Regex;

static HEADING_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?[hH]([1-6])((?:[^<>]*))>").expect("valid heading pattern"));

/// Heading levels of a content document in document order
#[must_use]
pub fn heading_levels(content: &str) -> Vec<u8> {
    HEADING_TAG
        .captures_iter(content)
        .filter(|caps| !caps[0].starts_with("</"))
        .map(|caps| caps[1].as_bytes()[0] - b'0')
        .collect()
}

/// Compute the normalized level for every heading.
///
/// Two passes over the level sequence: first the run of headings before the
/// first true h1 (or all of them, if there is none) is shifted down by the
/// minimal constant that makes the sequence start at 1; then, scanning left
/// to right, any heading that jumps more than one level past the running
/// maximum is clamped to running-max + 1.
fn normalized_levels(levels: &[u8]) -> Vec<u8> {
    let Some(&first) = levels.first() else {
        return Vec::new();
    };

    let mut out: Vec<u8> = levels.to_vec();
    if first > 1 {
        let shift = first - 1;
        let run_end = levels.iter().position(|&l| l == 1).unwrap_or(levels.len());
        for level in &mut out[..run_end] {
            *level = level.saturating_sub(shift).max(1);
        }
    }

    let mut running_max = 0u8;
    for level in &mut out {
        if *level > running_max + 1 {
            *level = running_max + 1;
        }
        running_max = running_max.max(*level);
    }
    out
}

/// Normalize the heading hierarchy of one content document.
///
/// All attributes on shifted headings are preserved; closing tags follow
/// their opening tag's new level. Returns `None` when the document already
/// satisfies the hierarchy invariants.
#[must_use]
pub fn normalize_headings(content: &str) -> Option<String> {
    let levels = heading_levels(content);
    let normalized = normalized_levels(&levels);
    if levels == normalized {
        return None;
    }

    let mut out = String::with_capacity(content.len());
    let mut cursor = 0usize;
    let mut opening_index = 0usize;
    // Closing tags take the new level of the most recent unmatched opening.
    let mut open_stack: Vec<u8> = Vec::new();

    for caps in HEADING_TAG.captures_iter(content) {
        let whole = caps.get(0).expect("match");
        out.push_str(&content[cursor..whole.start()]);
        cursor = whole.end();

        let attrs = caps.get(2).map_or("", |m| m.as_str());
        if whole.as_str().starts_with("</") {
            let level = open_stack
                .pop()
                .unwrap_or_else(|| caps[1].as_bytes()[0] - b'0');
            out.push_str(&format!("</h{level}>"));
        } else {
            let level = normalized[opening_index];
            opening_index += 1;
            open_stack.push(level);
            out.push_str(&format!("<h{level}{attrs}>"));
        }
    }
    out.push_str(&content[cursor..]);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn shifts_leading_run_to_start_at_one() {
        let content = "<body><h3>A</h3><h4>B</h4></body>";
        let fixed = normalize_headings(content).expect("changed");
        assert_eq!(fixed, "<body><h1>A</h1><h2>B</h2></body>");
    }

    #[test]
    fn only_the_run_before_the_first_true_h1_is_shifted() {
        let content = "<h2>Pre</h2><h1>Start</h1><h2>Next</h2>";
        let fixed = normalize_headings(content).expect("changed");
        assert_eq!(fixed, "<h1>Pre</h1><h1>Start</h1><h2>Next</h2>");
    }

    #[test]
    fn clamps_jumps_past_running_max() {
        let content = "<h1>A</h1><h4>B</h4><h2>C</h2>";
        let fixed = normalize_headings(content).expect("changed");
        assert_eq!(fixed, "<h1>A</h1><h2>B</h2><h2>C</h2>");
    }

    #[test]
    fn attributes_survive_the_shift() {
        let content = r#"<h3 id="intro" class="title">A</h3>"#;
        let fixed = normalize_headings(content).expect("changed");
        assert_eq!(fixed, r#"<h1 id="intro" class="title">A</h1>"#);
    }

    #[test]
    fn compliant_documents_are_untouched() {
        assert_eq!(normalize_headings("<h1>A</h1><h2>B</h2><h2>C</h2>"), None);
        assert_eq!(normalize_headings("<p>no headings</p>"), None);
    }

    #[test]
    fn normalization_is_idempotent() {
        let content = "<h2>Pre</h2><h5>Deep</h5><h1>Start</h1><h4>Jump</h4>";
        let once = normalize_headings(content).expect("changed");
        assert_eq!(normalize_headings(&once), None);
    }

    proptest! {
        #[test]
        fn proptest_first_is_one_and_no_jump_exceeds_running_max(
            levels in proptest::collection::vec(1u8..=6, 1..20)
        ) {
            let content: String = levels
                .iter()
                .map(|l| format!("<h{l}>x</h{l}>"))
                .collect();
            let fixed = normalize_headings(&content).unwrap_or(content);
            let out = heading_levels(&fixed);
            prop_assert_eq!(out[0], 1);
            let mut running_max = 0u8;
            for level in out {
                prop_assert!(level <= running_max + 1);
                running_max = running_max.max(level);
            }
        }
    }
}
