//! # Remedy Model
//!
//! Canonical issue/task data model for accessibility remediation, plus the
//! tally engine that proves no issue is dropped or invented between pipeline
//! stages.
//!
//! ## Architecture
//!
//! ```text
//! Detector output (normalized Issues)
//!     │
//!     ├──> sanitize  (drop malformed entries, count rejects)
//!     │
//!     ├──> dedup     (collapse cross-detector duplicates)
//!     │
//!     ├──> classify  (code -> auto | quickfix | manual)
//!     │
//!     └──> Tally     (per-source / per-severity / per-fix-type counts,
//!                     conservation-checked across stages)
//! ```

mod classify;
mod error;
mod issue;
mod tally;
mod task;

pub use classify::{classify, dedup, sanitize, ClassifyConfig, FixType};
pub use error::{ModelError, Result};
pub use issue::{Issue, IssueSource, Severity};
pub use tally::{create_tally, validate_transition, Tallied, Tally, TallyDelta, ValidationResult};
pub use task::{task_id, CompletionMethod, Priority, Task, TaskStatus};
