use thiserror::Error;

/// Result type for patch operations
pub type Result<T> = std::result::Result<T, PatchError>;

const EXCERPT_LEN: usize = 120;

/// Errors that can occur while applying a change
#[derive(Error, Debug)]
pub enum PatchError {
    /// No cascade strategy could locate the anchor
    #[error("No match strategy located the anchor: \"{excerpt}\"")]
    NoMatch { excerpt: String },

    /// The operation requires an anchor and none was supplied
    #[error("Change requires an anchor (oldContent) but none was supplied")]
    EmptyAnchor,

    /// The operation requires replacement content and none was supplied
    #[error("Change requires replacement content but none was supplied")]
    EmptyReplacement,
}

impl PatchError {
    /// Create a no-match error carrying a clamped excerpt of the anchor
    pub fn no_match(anchor: &str) -> Self {
        Self::NoMatch {
            excerpt: clamp_excerpt(anchor, EXCERPT_LEN),
        }
    }
}

/// Clamp a string to at most `max` chars on a char boundary
#[must_use]
pub(crate) fn clamp_excerpt(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let clipped: String = text.chars().take(max).collect();
    format!("{clipped}…")
}
