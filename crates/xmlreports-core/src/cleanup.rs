//! Scratch directory cleanup. Best-effort and never fatal.

use crate::error::CleanupError;
use crate::pool::WorkerPool;
use log::{debug, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Recursively remove one directory. A directory that is already gone counts
/// as removed.
///
/// # Errors
///
/// [`CleanupError::Io`] for any failure other than "not found".
pub fn remove_scratch_dir(path: &Path) -> Result<(), CleanupError> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            debug!("Removed scratch directory {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(CleanupError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Remove every directory on the pool and collect the failures.
///
/// All directories are attempted regardless of earlier failures. Calling this
/// again on the same set is a no-op.
pub fn cleanup_all(pool: &WorkerPool, dirs: &[PathBuf]) -> Vec<CleanupError> {
    let errors: Vec<CleanupError> = pool
        .map_all(dirs, |dir| remove_scratch_dir(dir))
        .into_iter()
        .filter_map(Result::err)
        .collect();

    for error in &errors {
        warn!("Cleanup: {error}");
    }
    errors
}
