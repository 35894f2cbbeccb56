//! Error types for archive extraction

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while unpacking one archive into its scratch directory
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The archive bytes are not a readable ZIP container
    #[error("corrupt archive {}: {source}", archive.display())]
    CorruptArchive {
        /// Archive that failed to open or decode
        archive: PathBuf,
        /// Underlying decoder error
        #[source]
        source: zip::result::ZipError,
    },

    /// A member name would resolve outside the scratch directory
    #[error("unsafe member path {member:?} in archive {}", archive.display())]
    UnsafeMemberPath {
        /// Archive containing the offending member
        archive: PathBuf,
        /// Raw member name as stored in the archive
        member: String,
    },

    /// Two member names resolve to the same file inside the scratch directory
    #[error("duplicate member path {member:?} in archive {}", archive.display())]
    DuplicateMember {
        /// Archive containing the colliding members
        archive: PathBuf,
        /// Raw name of the later member, as stored in the archive
        member: String,
    },

    /// Filesystem failure (missing archive, disk full, permission denied)
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// Path being read or written when the failure happened
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

impl ExtractError {
    /// Path of the archive or file this error refers to
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::CorruptArchive { archive, .. }
            | Self::UnsafeMemberPath { archive, .. }
            | Self::DuplicateMember { archive, .. } => archive,
            Self::Io { path, .. } => path,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify a decoder error. Truncated or undecodable data means the archive
    /// is damaged; any other IO failure is reported as IO.
    pub(crate) fn from_zip(archive: &std::path::Path, err: zip::result::ZipError) -> Self {
        use std::io::ErrorKind;

        match err {
            zip::result::ZipError::Io(source)
                if !matches!(
                    source.kind(),
                    ErrorKind::UnexpectedEof | ErrorKind::InvalidData
                ) =>
            {
                Self::io(archive, source)
            }
            source => Self::CorruptArchive {
                archive: archive.to_path_buf(),
                source,
            },
        }
    }
}
