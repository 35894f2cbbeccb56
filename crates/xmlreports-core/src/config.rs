//! Pipeline settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default file name of the `levels` report
pub const DEFAULT_LEVELS_FILE: &str = "levels.csv";
/// Default file name of the `objects` report
pub const DEFAULT_OBJECTS_FILE: &str = "objects.csv";
/// Default extension of input archives
pub const DEFAULT_ARCHIVE_EXTENSION: &str = "zip";

/// Settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker threads shared by extraction, parsing and cleanup
    pub workers: usize,
    /// Directory under which the run's scratch directories are created
    pub scratch_root: PathBuf,
    /// File name of the `levels` report inside the reports directory
    pub levels_file: String,
    /// File name of the `objects` report inside the reports directory
    pub objects_file: String,
    /// Extension (without dot, case-insensitive) that marks a file as an archive
    pub archive_extension: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            scratch_root: std::env::temp_dir(),
            levels_file: DEFAULT_LEVELS_FILE.to_string(),
            objects_file: DEFAULT_OBJECTS_FILE.to_string(),
            archive_extension: DEFAULT_ARCHIVE_EXTENSION.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Override the worker count (0 falls back to available parallelism)
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = if workers == 0 { default_workers() } else { workers };
        self
    }

    /// Override the scratch root
    #[must_use]
    pub fn with_scratch_root(mut self, scratch_root: impl Into<PathBuf>) -> Self {
        self.scratch_root = scratch_root.into();
        self
    }
}

/// One worker per available core, at least one.
#[must_use]
pub fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}
