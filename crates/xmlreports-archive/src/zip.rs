//! ZIP archive extraction into a scratch directory
//!
//! Every member of the archive is written below the scratch directory the caller
//! hands in. Member names are checked before anything is written, so an archive
//! carrying a traversal entry leaves no files behind at all.

use crate::error::ExtractError;
use log::debug;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};
use zip::ZipArchive;

/// Resolve an archive member name to a path relative to the scratch directory.
///
/// Returns `None` when the name escapes the directory:
/// - Parent directory references (..)
/// - Absolute path prefixes (/)
/// - Drive letters (C:\)
///
/// Current directory references (.) are dropped. A name that is empty after
/// that is also rejected.
#[inline]
fn member_relative_path(name: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();

    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(relative)
    }
}

/// Result of unpacking one archive
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ExtractedArchive {
    /// Archive that was unpacked
    pub archive: PathBuf,
    /// Scratch directory that now holds the members
    pub scratch_dir: PathBuf,
    /// Paths of the extracted documents, in archive member order
    pub documents: Vec<PathBuf>,
}

/// Unpack every file member of a ZIP archive into `scratch_dir`.
///
/// The scratch directory is created if missing; an existing directory (for
/// example from an interrupted earlier run) is reused and colliding files are
/// overwritten. Directory entries are skipped, nested member names create the
/// matching subdirectories.
///
/// # Errors
///
/// - [`ExtractError::UnsafeMemberPath`] if any member name resolves outside
///   `scratch_dir`. Checked for all members before the first write.
/// - [`ExtractError::DuplicateMember`] if two file members resolve to the same
///   path. Also checked before the first write.
/// - [`ExtractError::CorruptArchive`] if the archive or a member cannot be decoded
/// - [`ExtractError::Io`] if the archive cannot be read or a member cannot be written
#[must_use = "the extracted document paths and scratch directory must be tracked"]
pub fn extract_zip_to_dir(archive: &Path, scratch_dir: &Path) -> Result<ExtractedArchive, ExtractError> {
    fs::create_dir_all(scratch_dir).map_err(|e| ExtractError::io(scratch_dir, e))?;

    let file = File::open(archive).map_err(|e| ExtractError::io(archive, e))?;
    let reader = BufReader::new(file);
    let mut zip = ZipArchive::new(reader).map_err(|e| ExtractError::from_zip(archive, e))?;

    // SECURITY: validate the whole central directory before writing anything
    let mut members = Vec::with_capacity(zip.len());
    let mut resolved = HashSet::with_capacity(zip.len());
    for i in 0..zip.len() {
        let entry = zip
            .by_index_raw(i)
            .map_err(|e| ExtractError::from_zip(archive, e))?;
        let raw_name = entry.name().to_string();
        let Some(relative) = member_relative_path(&raw_name) else {
            return Err(ExtractError::UnsafeMemberPath {
                archive: archive.to_path_buf(),
                member: raw_name,
            });
        };
        if entry.is_dir() {
            continue;
        }
        // `a.xml` and `./a.xml` land on the same file
        if !resolved.insert(relative.clone()) {
            return Err(ExtractError::DuplicateMember {
                archive: archive.to_path_buf(),
                member: raw_name,
            });
        }
        members.push((i, relative));
    }

    let mut documents = Vec::with_capacity(members.len());
    for (index, relative) in members {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| ExtractError::from_zip(archive, e))?;

        // Decode fully before touching the filesystem so a damaged member is
        // reported as corruption rather than as a write failure.
        let declared = usize::try_from(entry.size()).unwrap_or(0);
        let mut contents = Vec::with_capacity(declared.min(crate::MAX_PREALLOCATION));
        entry
            .read_to_end(&mut contents)
            .map_err(|e| ExtractError::from_zip(archive, zip::result::ZipError::Io(e)))?;

        let target = scratch_dir.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| ExtractError::io(parent, e))?;
        }
        fs::write(&target, &contents).map_err(|e| ExtractError::io(&target, e))?;
        documents.push(target);
    }

    debug!(
        "Extracted {} members from {} into {}",
        documents.len(),
        archive.display(),
        scratch_dir.display()
    );

    Ok(ExtractedArchive {
        archive: archive.to_path_buf(),
        scratch_dir: scratch_dir.to_path_buf(),
        documents,
    })
}
