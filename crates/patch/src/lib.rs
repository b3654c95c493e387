//! # Remedy Patch
//!
//! The patch-application engine: given a text member and a change whose
//! anchor was captured at detection time, locate the fragment the change
//! refers to even after the surrounding markup has drifted, and rewrite it
//! without disturbing unrelated attributes.
//!
//! ## Matching cascade
//!
//! ```text
//! apply_change(content, change)
//!     │
//!     ├──> 1. exact substring match of the anchor
//!     ├──> 2. attribute-aware tag match (merge maps, preserve extras)
//!     ├──> 3. whitespace-flexible pattern match
//!     ├──> 4. semantic-attribute match (epub:type -> role)
//!     └──> 5. tag-by-key-attribute fallback
//! ```
//!
//! Each strategy is a pure function `(content, change) -> Option<content'>`;
//! the cascade is a short-circuiting iteration over an ordered list, and the
//! winning strategy is recorded for diagnostics.

mod attrs;
mod change;
mod changelog;
mod error;
mod matcher;

pub use attrs::{merge_attributes, parse_opening_tag, serialize_tag, ParsedTag};
pub use change::{Change, ChangeOp};
pub use changelog::{ChangeLog, ChangeRecord};
pub use error::{PatchError, Result};
pub use matcher::{apply_change, Applied, MatchStrategy};
