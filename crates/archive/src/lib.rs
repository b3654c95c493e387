//! # Remedy Archive
//!
//! Read/write abstraction over a packaged, zip-based document (EPUB-style):
//! metadata package document plus XHTML content members.
//!
//! The archive is loaded once into an owned path -> member map, mutated in
//! place member-by-member by a single remediation pass, and serialized once
//! at the end. No pass holds a long-lived alias into another pass's working
//! copy.

mod archive;
mod error;

pub use archive::{Archive, Member};
pub use error::{ArchiveError, Result};
