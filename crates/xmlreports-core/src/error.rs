//! Error types for the report pipeline.
//!
//! Extraction and parsing errors are fatal to a run, as are write errors once
//! the records are in hand. Cleanup errors are collected and surfaced as
//! warnings; they never turn a finished run into a failed one.
//!
//! # Examples
//!
//! ```rust,ignore
//! use std::path::Path;
//! use xmlreports_core::{Pipeline, PipelineConfig, PipelineError};
//!
//! let summary = Pipeline::new(PipelineConfig::default())
//!     .run(Path::new("archives"), Path::new("reports"));
//! match summary.error() {
//!     Some(PipelineError::Extract(e)) => eprintln!("bad archive {}: {e}", e.path().display()),
//!     Some(PipelineError::Parse(e)) => eprintln!("bad document {}: {e}", e.path().display()),
//!     Some(e) => eprintln!("run failed: {e}"),
//!     None => println!("{} rows written", summary.level_rows),
//! }
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;

pub use xmlreports_archive::ExtractError;

/// Failure to turn one document file into a [`crate::DocumentRecord`].
#[derive(Error, Debug)]
pub enum ParseError {
    /// The document is not well-formed XML or lacks the
    /// identifier / level / objects slots in that order.
    #[error("malformed document {}: {reason}", path.display())]
    MalformedDocument {
        /// Document that failed to parse
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// The document could not be read.
    #[error("cannot read document {}: {source}", path.display())]
    Io {
        /// Document that failed to read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    /// Path of the document this error refers to
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::MalformedDocument { path, .. } | Self::Io { path, .. } => path,
        }
    }

    pub(crate) fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Failure while writing the report tables.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Filesystem failure on a report file or its temporary sibling
    #[error("cannot write report {}: {source}", path.display())]
    Io {
        /// Report (or report directory) being written
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

impl WriteError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure to remove a scratch directory. Never fatal.
#[derive(Error, Debug)]
pub enum CleanupError {
    /// Recursive removal failed for a reason other than "already gone"
    #[error("cannot remove scratch directory {}: {source}", path.display())]
    Io {
        /// Directory that could not be removed
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

impl CleanupError {
    /// Directory this error refers to
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } => path,
        }
    }
}

/// Fatal error that ends a run in the `Failed` state.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The archives directory could not be listed
    #[error("cannot list archives in {}: {source}", path.display())]
    Input {
        /// Archives directory
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The worker pool could not be started
    #[error("cannot start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// An archive could not be extracted
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// A document could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The reports could not be written
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Failure while producing a synthetic input corpus.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// Filesystem failure on the output directory or an archive
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// Path being written
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The ZIP writer failed
    #[error("cannot write archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The XML writer failed
    #[error("cannot render document: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Generator settings that cannot produce a valid corpus
    #[error("invalid generator settings: {0}")]
    InvalidConfig(String),
}
