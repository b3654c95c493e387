//! # Remedy Planner
//!
//! Turns a deduplicated issue list into an ordered, idempotent task list,
//! drives the structural repair algorithms over the archive, and proves via
//! tally conservation that no issue was dropped or invented along the way.
//!
//! ## Control flow
//!
//! ```text
//! raw issues (external detectors)
//!     │
//!     ├──> sanitize + dedup          (remedy-model)
//!     ├──> "audit" tally
//!     ├──> Plan::build -> tasks      ("plan" tally + conservation check)
//!     ├──> run_auto_remediation      (group by code, fixer registry,
//!     │                               change log per applied patch)
//!     └──> invariant validator pass  (self-heals remaining violations)
//! ```

mod error;
mod fixers;
mod interfaces;
mod plan;
mod remediate;
mod stats;

pub use error::{PlanError, Result};
pub use interfaces::{Detector, PlanStore};
pub use plan::{Plan, Resolution};
pub use remediate::{run_auto_remediation, RemediationConfig, RemediationOutcome};
pub use stats::PlanStats;
