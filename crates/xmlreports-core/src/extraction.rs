//! Extraction stage: unpack every archive into its own scratch directory.

use crate::pool::{first_failure, WorkerPool};
use log::{info, warn};
use std::path::{Path, PathBuf};
use xmlreports_archive::{extract_zip_to_dir, ExtractError, ExtractedArchive};

/// One archive paired with the scratch directory it extracts into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveJob {
    /// Archive to unpack
    pub archive: PathBuf,
    /// Scratch directory owned by this archive for the run
    pub scratch_dir: PathBuf,
}

/// Name of the scratch directory for the archive at `index` in the run's
/// sorted archive list.
///
/// Derived from the position rather than the file stem, so two archives with
/// the same stem (`a.zip`, `a.ZIP`) never share a directory.
#[must_use]
pub fn scratch_dir_name(index: usize) -> String {
    format!("archive-{index:05}")
}

/// Assign every archive its scratch directory under `run_dir`.
#[must_use]
pub fn plan_jobs(archives: &[PathBuf], run_dir: &Path) -> Vec<ArchiveJob> {
    archives
        .iter()
        .enumerate()
        .map(|(index, archive)| ArchiveJob {
            archive: archive.clone(),
            scratch_dir: run_dir.join(scratch_dir_name(index)),
        })
        .collect()
}

/// Fan-in of the extraction stage.
#[derive(Debug)]
pub struct ExtractionOutcome {
    /// Scratch directories of every archive whose extraction started,
    /// successful or not. Cleanup must remove all of them.
    pub scratch_dirs: Vec<PathBuf>,
    /// Every extracted document path, grouped by archive in input order, or
    /// the first extraction error.
    pub documents: Result<Vec<PathBuf>, ExtractError>,
}

/// Extract all archives on the pool, fail-fast.
///
/// After the first failure no new archive is started; extractions already in
/// flight run to completion so their directories are known to cleanup.
pub fn extract_all(pool: &WorkerPool, jobs: &[ArchiveJob]) -> ExtractionOutcome {
    info!("Extracting {} archives with {} workers", jobs.len(), pool.workers());

    let outcomes = pool.fan_out(jobs, |job| {
        extract_zip_to_dir(&job.archive, &job.scratch_dir).inspect_err(|e| {
            warn!("Extraction failed: {e}");
        })
    });

    let scratch_dirs = jobs
        .iter()
        .zip(&outcomes)
        .filter(|(_, outcome)| outcome.was_started())
        .map(|(job, _)| job.scratch_dir.clone())
        .collect();

    let documents = first_failure(outcomes).map(|archives| {
        archives
            .into_iter()
            .flat_map(|ExtractedArchive { documents, .. }| documents)
            .collect::<Vec<_>>()
    });

    if let Ok(documents) = &documents {
        info!("Extracted {} documents", documents.len());
    }

    ExtractionOutcome {
        scratch_dirs,
        documents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::{SimpleFileOptions, ZipWriter};

    fn write_zip(path: &Path, members: &[&str]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for member in members {
            zip.start_file(*member, SimpleFileOptions::default()).unwrap();
            zip.write_all(member.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_plan_uses_index_not_stem() {
        let archives = vec![PathBuf::from("in/a.zip"), PathBuf::from("other/a.zip")];
        let jobs = plan_jobs(&archives, Path::new("/run"));

        assert_eq!(jobs[0].scratch_dir, Path::new("/run/archive-00000"));
        assert_eq!(jobs[1].scratch_dir, Path::new("/run/archive-00001"));
    }

    #[test]
    fn test_extract_all_groups_documents_by_archive() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("archive0.zip");
        let second = temp.path().join("archive1.zip");
        write_zip(&first, &["file0.xml", "file1.xml"]);
        write_zip(&second, &["file0.xml"]);
        let jobs = plan_jobs(&[first, second], &temp.path().join("run"));
        let pool = WorkerPool::new(2).unwrap();

        let outcome = extract_all(&pool, &jobs);

        let documents = outcome.documents.unwrap();
        assert_eq!(
            documents,
            vec![
                jobs[0].scratch_dir.join("file0.xml"),
                jobs[0].scratch_dir.join("file1.xml"),
                jobs[1].scratch_dir.join("file0.xml"),
            ]
        );
        assert_eq!(outcome.scratch_dirs.len(), 2);
    }

    #[test]
    fn test_failed_archive_still_reports_its_scratch_dir() {
        let temp = TempDir::new().unwrap();
        let broken = temp.path().join("archive0.zip");
        fs::write(&broken, b"garbage").unwrap();
        let jobs = plan_jobs(&[broken.clone()], &temp.path().join("run"));
        let pool = WorkerPool::new(1).unwrap();

        let outcome = extract_all(&pool, &jobs);

        let err = outcome.documents.unwrap_err();
        assert!(matches!(err, ExtractError::CorruptArchive { .. }));
        assert_eq!(err.path(), broken.as_path());
        assert_eq!(outcome.scratch_dirs, vec![jobs[0].scratch_dir.clone()]);
        assert!(jobs[0].scratch_dir.is_dir());
    }

    #[test]
    fn test_no_archives() {
        let pool = WorkerPool::new(1).unwrap();
        let outcome = extract_all(&pool, &[]);
        assert!(outcome.documents.unwrap().is_empty());
        assert!(outcome.scratch_dirs.is_empty());
    }
}
