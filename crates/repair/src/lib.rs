//! # Remedy Repair
//!
//! Structural repair algorithms that must satisfy document-wide invariants,
//! not just local ones:
//!
//! - heading-hierarchy normalization (first heading is h1, no level ever
//!   jumps more than one past the running maximum)
//! - primary-landmark insertion (exactly one main landmark across the whole
//!   content set)
//! - WCAG contrast-ratio color repair (4.5:1, emitted as a CSS override)
//! - the post-remediation invariant validator that self-heals any content
//!   file still missing a landmark role

mod contrast;
mod error;
mod headings;
mod landmarks;
mod validator;

pub use contrast::{
    contrast_ratio, fix_contrast, parse_color, relative_luminance, repair_contrast, ContrastFix,
    Rgb, DEFAULT_LOW_CONTRAST,
};
pub use error::{RepairError, Result};
pub use headings::{heading_levels, normalize_headings};
pub use landmarks::{ensure_main_landmark, has_main_landmark, LandmarkOutcome};
pub use validator::{validate_landmarks, ValidationFix, ValidationOutcome};
