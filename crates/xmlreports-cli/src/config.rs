//! Configuration files for the `xmlreports` binary.
//!
//! Configuration files can be placed in:
//! - User home directory: `~/.xmlreports.toml` (user defaults)
//! - Project directory: `./.xmlreports.toml` (project defaults)
//!
//! Precedence order (highest to lowest):
//! 1. Command-line arguments (`--jobs`, `--scratch-dir`, etc.)
//! 2. Project config
//! 3. User config
//! 4. Built-in defaults

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use xmlreports_core::{GeneratorConfig, PipelineConfig};

/// File name of both the user and the project config
pub const CONFIG_FILE_NAME: &str = ".xmlreports.toml";

/// Written by `xmlreports config init`
pub const DEFAULT_CONFIG: &str = r#"# xmlreports configuration file
# See: https://github.com/dropbox/dKNOW/xmlreports

# Default settings for the report command
[report]
# Worker threads (default: number of CPU cores)
# workers = 8

# Directory under which scratch directories are created (default: system temp dir)
# scratch_dir = "/tmp"

# Report file names inside the reports directory
# levels_file = "levels.csv"
# objects_file = "objects.csv"

# Default settings for the generate command
[generate]
# Number of archives
# archives = 50

# Documents per archive
# documents = 100

# Upper bound of objects per document
# max_objects = 10
"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Default settings for the report command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportConfig>,

    /// Default settings for the generate command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate: Option<GenerateConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReportConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub levels_file: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub objects_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GenerateConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archives: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_objects: Option<usize>,
}

impl ReportConfig {
    /// Fields set in `other` win
    fn overlay(self, other: Self) -> Self {
        Self {
            workers: other.workers.or(self.workers),
            scratch_dir: other.scratch_dir.or(self.scratch_dir),
            levels_file: other.levels_file.or(self.levels_file),
            objects_file: other.objects_file.or(self.objects_file),
        }
    }

    /// Apply these settings on top of `base`
    pub fn apply(&self, mut base: PipelineConfig) -> PipelineConfig {
        if let Some(workers) = self.workers {
            base = base.with_workers(workers);
        }
        if let Some(scratch_dir) = &self.scratch_dir {
            base = base.with_scratch_root(scratch_dir);
        }
        if let Some(levels_file) = &self.levels_file {
            base.levels_file.clone_from(levels_file);
        }
        if let Some(objects_file) = &self.objects_file {
            base.objects_file.clone_from(objects_file);
        }
        base
    }
}

impl GenerateConfig {
    /// Fields set in `other` win
    fn overlay(self, other: Self) -> Self {
        Self {
            archives: other.archives.or(self.archives),
            documents: other.documents.or(self.documents),
            max_objects: other.max_objects.or(self.max_objects),
        }
    }

    /// Apply these settings on top of `base`
    pub fn apply(&self, mut base: GeneratorConfig) -> GeneratorConfig {
        if let Some(archives) = self.archives {
            base.archives = archives;
        }
        if let Some(documents) = self.documents {
            base.documents_per_archive = documents;
        }
        if let Some(max_objects) = self.max_objects {
            base.max_objects = max_objects;
        }
        base
    }
}

impl Config {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find and load configuration files
    /// Returns (`user_config`, `project_config`)
    pub fn discover_configs() -> (Option<Self>, Option<Self>) {
        let user_config = user_config_path().and_then(|path| Self::load_if_present(&path, "user"));
        let project_config = Self::load_if_present(&project_config_path(), "project");
        (user_config, project_config)
    }

    /// Discover both files and merge them
    pub fn discover() -> Self {
        let (user_config, project_config) = Self::discover_configs();
        Self::merge(user_config, project_config)
    }

    /// A file that exists but cannot be loaded is reported and skipped
    fn load_if_present(path: &Path, kind: &str) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!(
                    "{} Failed to load {kind} config from {}: {e:#}",
                    "Warning:".yellow().bold(),
                    path.display()
                );
                None
            }
        }
    }

    /// Merge multiple configs with precedence
    /// CLI args > project config > user config > defaults
    pub fn merge(user_config: Option<Self>, project_config: Option<Self>) -> Self {
        let mut merged = Self::default();
        for config in [user_config, project_config].into_iter().flatten() {
            merged.report = overlay_section(merged.report, config.report, ReportConfig::overlay);
            merged.generate = overlay_section(merged.generate, config.generate, GenerateConfig::overlay);
        }
        merged
    }

    pub fn report(&self) -> ReportConfig {
        self.report.clone().unwrap_or_default()
    }

    pub fn generate(&self) -> GenerateConfig {
        self.generate.clone().unwrap_or_default()
    }
}

fn overlay_section<T: Default>(base: Option<T>, other: Option<T>, overlay: fn(T, T) -> T) -> Option<T> {
    match (base, other) {
        (base, Some(other)) => Some(overlay(base.unwrap_or_default(), other)),
        (base, None) => base,
    }
}

/// `~/.xmlreports.toml`, if a home directory is known
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
}

/// `./.xmlreports.toml`
pub fn project_config_path() -> PathBuf {
    PathBuf::from(CONFIG_FILE_NAME)
}
