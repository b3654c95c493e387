use serde::{Deserialize, Serialize};

/// Kind of text operation a change performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    /// Insert new content after the anchor, or at end of file when no
    /// anchor is given
    Insert,
    /// Replace the anchored fragment with new content
    Replace,
    /// Remove the anchored fragment
    Delete,
}

/// One patch operation against one text member.
///
/// The anchor (`old_content`) is the markup fragment captured when the
/// issue was detected; by the time the fix is applied the file may have
/// drifted, which is what the matching cascade absorbs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Change {
    /// Operation kind
    pub op: ChangeOp,

    /// Anchor fragment to locate. Required for replace/delete; optional
    /// for insert (absent means append at end of file).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_content: Option<String>,

    /// Content to write. Required for insert/replace; ignored for delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_content: Option<String>,
}

impl Change {
    /// Replace `anchor` with `replacement`
    pub fn replace(anchor: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            op: ChangeOp::Replace,
            old_content: Some(anchor.into()),
            new_content: Some(replacement.into()),
        }
    }

    /// Insert `content` immediately after `anchor`
    pub fn insert_after(anchor: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            op: ChangeOp::Insert,
            old_content: Some(anchor.into()),
            new_content: Some(content.into()),
        }
    }

    /// Append `content` at the end of the member
    pub fn append(content: impl Into<String>) -> Self {
        Self {
            op: ChangeOp::Insert,
            old_content: None,
            new_content: Some(content.into()),
        }
    }

    /// Delete the anchored fragment
    pub fn delete(anchor: impl Into<String>) -> Self {
        Self {
            op: ChangeOp::Delete,
            old_content: Some(anchor.into()),
            new_content: None,
        }
    }

    /// The anchor, if any
    #[must_use]
    pub fn anchor(&self) -> Option<&str> {
        self.old_content.as_deref()
    }

    /// The replacement content, if any
    #[must_use]
    pub fn replacement(&self) -> Option<&str> {
        self.new_content.as_deref()
    }
}
