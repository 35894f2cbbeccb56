//! Pipeline orchestration.
//!
//! ```text
//! Idle -> Extracting -> Parsing -> Writing -> CleaningUp -> Done
//!             |            |          |            ^
//!             +------------+----------+------------+  (on error)
//!                                                  |
//!                                                  +-> Failed
//! ```
//!
//! Each stage finishes (or fail-fast aborts) before the next starts. Cleanup
//! runs after `Writing` whatever its outcome, and after a failed `Extracting`
//! or `Parsing`, on every scratch directory whose extraction started. `Writing`
//! is never entered once an earlier stage failed.

use crate::cleanup::{cleanup_all, remove_scratch_dir};
use crate::config::PipelineConfig;
use crate::error::{CleanupError, PipelineError};
use crate::extraction::{extract_all, plan_jobs};
use crate::parsing::{duplicate_ids, parse_all};
use crate::pool::WorkerPool;
use crate::report::write_reports;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Lifecycle of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Extracting,
    Parsing,
    Writing,
    CleaningUp,
    /// Reports written, cleanup attempted
    Done,
    /// A fatal error ended the run; reports were not written or are not to be trusted
    Failed,
}

impl PipelineState {
    /// Whether the run has ended
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Process exit status derived from a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitStatus {
    /// `Done` with no cleanup warnings
    Success,
    /// `Failed`
    Failed,
    /// `Done`, but some scratch directories could not be removed
    CompletedWithWarnings,
}

impl ExitStatus {
    /// Numeric process exit code
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failed => 1,
            Self::CompletedWithWarnings => 3,
        }
    }
}

impl From<&RunSummary> for ExitStatus {
    fn from(summary: &RunSummary) -> Self {
        match summary.state {
            PipelineState::Done if summary.cleanup_warnings.is_empty() => Self::Success,
            PipelineState::Done => Self::CompletedWithWarnings,
            _ => Self::Failed,
        }
    }
}

/// Outcome of one run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    /// Terminal state
    pub state: PipelineState,
    /// States visited, in order
    pub states: Vec<PipelineState>,
    /// Archives discovered
    pub archives: usize,
    /// Documents extracted
    pub documents: usize,
    /// Rows written to the `levels` table
    pub level_rows: usize,
    /// Rows written to the `objects` table
    pub object_rows: usize,
    /// Scratch directories removed (or already absent)
    pub scratch_dirs_removed: usize,
    /// Ids seen more than once
    pub duplicate_ids: Vec<String>,
    /// Written `levels` report, when the run is `Done`
    pub levels_path: Option<PathBuf>,
    /// Written `objects` report, when the run is `Done`
    pub objects_path: Option<PathBuf>,
    /// Fatal error message, when the run is `Failed`
    pub error: Option<String>,
    /// Cleanup failures
    pub cleanup_warnings: Vec<String>,
    /// Wall-clock duration in seconds
    pub elapsed_secs: f64,
    #[serde(skip)]
    failure: Option<PipelineError>,
    #[serde(skip)]
    cleanup_errors: Vec<CleanupError>,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            state: PipelineState::Idle,
            states: vec![PipelineState::Idle],
            archives: 0,
            documents: 0,
            level_rows: 0,
            object_rows: 0,
            scratch_dirs_removed: 0,
            duplicate_ids: Vec::new(),
            levels_path: None,
            objects_path: None,
            error: None,
            cleanup_warnings: Vec::new(),
            elapsed_secs: 0.0,
            failure: None,
            cleanup_errors: Vec::new(),
        }
    }

    /// The fatal error, if the run failed
    #[must_use]
    pub fn error(&self) -> Option<&PipelineError> {
        self.failure.as_ref()
    }

    /// Cleanup failures, if any
    #[must_use]
    pub fn cleanup_errors(&self) -> &[CleanupError] {
        &self.cleanup_errors
    }

    /// Exit status for this run
    #[must_use]
    pub fn exit_status(&self) -> ExitStatus {
        ExitStatus::from(self)
    }
}

/// Orchestrates extraction, parsing, writing and cleanup for one batch.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline that runs with `config`
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Settings this pipeline runs with
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process every archive in `archives_dir` and write both reports into
    /// `reports_dir`.
    ///
    /// Scratch directories live in a fresh run directory under the configured
    /// scratch root.
    pub fn run(&self, archives_dir: &Path, reports_dir: &Path) -> RunSummary {
        let run_dir = self.config.scratch_root.join(run_dir_name());
        self.run_in(archives_dir, reports_dir, &run_dir)
    }

    /// Like [`Pipeline::run`], with the run directory chosen by the caller.
    ///
    /// The directory may already exist. Archive `i` extracts into
    /// `run_dir/archive-<i:05>`, and `run_dir` itself is removed during cleanup.
    pub fn run_in(&self, archives_dir: &Path, reports_dir: &Path, run_dir: &Path) -> RunSummary {
        let started = Instant::now();
        let mut summary = RunSummary::new();

        transition(&mut summary, PipelineState::Extracting);
        let pool = match WorkerPool::new(self.config.workers) {
            Ok(pool) => pool,
            Err(e) => {
                // nothing was extracted, so there is nothing to clean up
                fail(&mut summary, e.into());
                summary.elapsed_secs = started.elapsed().as_secs_f64();
                return summary;
            }
        };

        let mut scratch_dirs = Vec::new();
        let result = self.produce_reports(&pool, archives_dir, reports_dir, run_dir, &mut scratch_dirs, &mut summary);

        transition(&mut summary, PipelineState::CleaningUp);
        let mut cleanup_errors = cleanup_all(&pool, &scratch_dirs);
        summary.scratch_dirs_removed = scratch_dirs.len() - cleanup_errors.len();
        if let Err(e) = remove_scratch_dir(run_dir) {
            warn!("Cleanup: {e}");
            cleanup_errors.push(e);
        }
        summary.cleanup_warnings = cleanup_errors.iter().map(ToString::to_string).collect();
        summary.cleanup_errors = cleanup_errors;

        match result {
            Ok(()) => transition(&mut summary, PipelineState::Done),
            Err(e) => fail(&mut summary, e),
        }

        summary.elapsed_secs = started.elapsed().as_secs_f64();
        info!(
            "Run finished in {:?} after {:.2}s: {} archives, {} documents, {} level rows, {} object rows",
            summary.state,
            summary.elapsed_secs,
            summary.archives,
            summary.documents,
            summary.level_rows,
            summary.object_rows
        );
        summary
    }

    /// Extracting, Parsing and Writing. Returns at the first fatal error;
    /// `scratch_dirs` always lists every directory extraction started on.
    fn produce_reports(
        &self,
        pool: &WorkerPool,
        archives_dir: &Path,
        reports_dir: &Path,
        run_dir: &Path,
        scratch_dirs: &mut Vec<PathBuf>,
        summary: &mut RunSummary,
    ) -> Result<(), PipelineError> {
        let archives = discover_archives(archives_dir, &self.config.archive_extension).map_err(|source| {
            PipelineError::Input {
                path: archives_dir.to_path_buf(),
                source,
            }
        })?;
        summary.archives = archives.len();

        let jobs = plan_jobs(&archives, run_dir);
        let extraction = extract_all(pool, &jobs);
        *scratch_dirs = extraction.scratch_dirs;
        let documents = extraction.documents?;
        summary.documents = documents.len();

        transition(summary, PipelineState::Parsing);
        let records = parse_all(pool, &documents)?;

        summary.duplicate_ids = duplicate_ids(&records);
        if !summary.duplicate_ids.is_empty() {
            warn!(
                "{} identifiers occur more than once (first: {})",
                summary.duplicate_ids.len(),
                summary.duplicate_ids[0]
            );
        }

        transition(summary, PipelineState::Writing);
        let levels_path = reports_dir.join(&self.config.levels_file);
        let objects_path = reports_dir.join(&self.config.objects_file);
        let stats = write_reports(&records, &levels_path, &objects_path)?;
        summary.level_rows = stats.level_rows;
        summary.object_rows = stats.object_rows;
        summary.levels_path = Some(levels_path);
        summary.objects_path = Some(objects_path);
        Ok(())
    }
}

/// Run the pipeline with default settings and map the outcome to an exit status.
pub fn run_extract_and_report(archives_dir: &Path, reports_dir: &Path) -> ExitStatus {
    Pipeline::new(PipelineConfig::default())
        .run(archives_dir, reports_dir)
        .exit_status()
}

/// Regular files in `dir` whose extension matches `extension`
/// (case-insensitive), sorted by path.
///
/// # Errors
///
/// Returns the IO error if `dir` cannot be listed.
pub fn discover_archives(dir: &Path, extension: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut archives = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension));
        if matches && path.is_file() {
            archives.push(path);
        }
    }
    archives.sort();
    debug!("Found {} archives in {}", archives.len(), dir.display());
    Ok(archives)
}

fn transition(summary: &mut RunSummary, next: PipelineState) {
    debug!("Pipeline: {:?} -> {:?}", summary.state, next);
    summary.state = next;
    summary.states.push(next);
}

fn fail(summary: &mut RunSummary, err: PipelineError) {
    error!("Pipeline failed: {err}");
    summary.error = Some(err.to_string());
    summary.failure = Some(err);
    summary.levels_path = None;
    summary.objects_path = None;
    transition(summary, PipelineState::Failed);
}

/// Unique per process and per run, so concurrent runs sharing a scratch root
/// never collide.
fn run_dir_name() -> String {
    static RUNS: AtomicUsize = AtomicUsize::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());
    let run = RUNS.fetch_add(1, Ordering::Relaxed);
    format!("xmlreports-{}-{nanos}-{run}", std::process::id())
}
