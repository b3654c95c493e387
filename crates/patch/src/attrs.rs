use once_cell::sync::Lazy;
use regex::Regex;

static OPENING_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^<\s*([A-Za-z][A-Za-z0-9:_-]*)((?:[^<>"']|"[^"]*"|'[^']*')*?)\s*(/?)\s*>$"#)
        .expect("valid opening-tag pattern")
});

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_:][A-Za-z0-9:._-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid attribute pattern")
});

/// A single opening tag decomposed into name and attribute pairs.
///
/// Attribute order is preserved: merged tags keep the original file's
/// attribute order so diffs stay minimal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTag {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub self_closing: bool,
}

impl ParsedTag {
    /// Value of an attribute, if present
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether every attribute pair of `other` is present with an equal
    /// value on this tag
    #[must_use]
    pub fn contains_all(&self, other: &ParsedTag) -> bool {
        other.attrs.iter().all(|(k, v)| self.get(k) == Some(v))
    }

    /// Whether at least one attribute pair of `other` is present with an
    /// equal value on this tag
    #[must_use]
    pub fn contains_any(&self, other: &ParsedTag) -> bool {
        other.attrs.iter().any(|(k, v)| self.get(k) == Some(v))
    }
}

/// Parse a string that consists of exactly one opening (or self-closing)
/// tag. Returns `None` for anything else: closing tags, multiple elements,
/// text content.
#[must_use]
pub fn parse_opening_tag(fragment: &str) -> Option<ParsedTag> {
    let fragment = fragment.trim();
    if fragment.starts_with("</") {
        return None;
    }
    let caps = OPENING_TAG.captures(fragment)?;
    let name = caps[1].to_string();
    let attr_text = caps.get(2).map_or("", |m| m.as_str());
    let self_closing = &caps[3] == "/";

    let mut attrs = Vec::new();
    for attr in ATTRIBUTE.captures_iter(attr_text) {
        let key = attr[1].to_string();
        let value = attr
            .get(2)
            .or_else(|| attr.get(3))
            .map_or(String::new(), |m| m.as_str().to_string());
        attrs.push((key, value));
    }
    Some(ParsedTag {
        name,
        attrs,
        self_closing,
    })
}

/// Merge attribute maps: new values override old, but every old attribute
/// absent from new is preserved. This is what keeps one repair from
/// silently deleting an attribute a previous repair added.
#[must_use]
pub fn merge_attributes(
    old: &[(String, String)],
    new: &[(String, String)],
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = old.to_vec();
    for (key, value) in new {
        if let Some(slot) = merged.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value.clone();
        } else {
            merged.push((key.clone(), value.clone()));
        }
    }
    merged
}

/// Serialize a tag back to markup, double-quoted, attributes in map order
#[must_use]
pub fn serialize_tag(name: &str, attrs: &[(String, String)], self_closing: bool) -> String {
    let mut out = String::from("<");
    out.push_str(name);
    for (key, value) in attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(value);
        out.push('"');
    }
    if self_closing {
        out.push_str("/>");
    } else {
        out.push('>');
    }
    out
}
