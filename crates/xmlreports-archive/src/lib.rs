//! Archive extraction for xmlreports
//!
//! Unpacks ZIP archives into caller-owned scratch directories. The caller picks
//! the directory name and owns its lifetime; this crate only creates it and
//! fills it.
//!
//! # Usage
//!
//! ```no_run
//! use xmlreports_archive::extract_zip_to_dir;
//! use std::path::Path;
//!
//! let extracted = extract_zip_to_dir(
//!     Path::new("archives/archive0.zip"),
//!     Path::new("/tmp/xmlreports/archive-00000"),
//! )
//! .unwrap();
//! for document in &extracted.documents {
//!     println!("Extracted: {}", document.display());
//! }
//! ```
//!
//! Member names are validated up front: a name containing `..`, a root, or a
//! drive prefix fails the whole archive with
//! [`ExtractError::UnsafeMemberPath`] and nothing is written.

pub mod error;
pub mod zip;

/// Upper bound for the buffer reserved from a member's declared size.
///
/// The declared size comes from the archive and is not trusted; larger members
/// still extract, the buffer just grows as it is filled.
pub const MAX_PREALLOCATION: usize = 16 * 1024 * 1024;

pub use error::ExtractError;
pub use zip::{extract_zip_to_dir, ExtractedArchive};
