// Counts and durations are formatted for display only.
#![allow(
    clippy::cast_precision_loss,     // f64 sufficient for rates in summaries
    clippy::needless_pass_by_value,  // clap hands over owned values
    clippy::unnecessary_wraps,       // consistent Result return for CLI handlers
)]

//! xmlreports CLI - archive directories in, CSV reports out
//!
//! Runs the extraction/parsing/report pipeline over a directory of ZIP
//! archives, and can generate a synthetic input corpus.

mod config;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use config::{project_config_path, user_config_path, Config, DEFAULT_CONFIG};
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use xmlreports_core::{
    generate_corpus, ExitStatus, GeneratorConfig, Pipeline, PipelineConfig, PipelineState, RunSummary,
};

/// Verbosity level for output control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Verbosity {
    /// Suppress all output except errors
    Quiet,
    /// Normal output (default)
    Normal,
    /// Verbose output with extra details
    Verbose,
}

impl Verbosity {
    /// Create from CLI flags
    const fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    /// Check if output should be shown (not quiet)
    const fn should_show_output(self) -> bool {
        !matches!(self, Self::Quiet)
    }

    /// Default log filter when `RUST_LOG` is not set
    const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "xmlreports",
    about = "Extract XML documents from ZIP archives and report them as CSV",
    long_about = "Extract XML documents from a directory of ZIP archives in parallel and write\n\
                  two CSV reports: levels (id,level) and objects (id,object).",
    version
)]
struct Args {
    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Show detailed processing information
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the levels and objects reports from a directory of archives
    #[command(long_about = "Build the levels and objects reports from a directory of archives.\n\
                            \n\
                            Exit codes: 0 success, 1 failure, 3 success with cleanup warnings.")]
    Report {
        /// Directory containing the input archives
        #[arg(long, value_name = "DIR", default_value = "archives")]
        archives: PathBuf,

        /// Directory the reports are written to (created if missing)
        #[arg(long, value_name = "DIR", default_value = "reports")]
        reports: PathBuf,

        /// Number of worker threads (default: number of CPU cores)
        #[arg(short = 'j', long, value_name = "N")]
        jobs: Option<usize>,

        /// Directory under which scratch directories are created
        #[arg(long, value_name = "DIR")]
        scratch_dir: Option<PathBuf>,

        /// Print the run summary as JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Generate a synthetic corpus of archives
    Generate {
        /// Output directory (created if missing)
        #[arg(short, long, value_name = "DIR", default_value = "archives")]
        output: PathBuf,

        /// Number of archives [default: 50]
        #[arg(long, value_name = "N")]
        archives: Option<usize>,

        /// Documents per archive [default: 100]
        #[arg(long, value_name = "K")]
        documents: Option<usize>,

        /// Upper bound of objects per document [default: 10]
        #[arg(long, value_name = "M")]
        max_objects: Option<usize>,

        /// RNG seed for a reproducible corpus
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Manage configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Create a configuration file with commented defaults
    Init {
        /// Create user config (~/.xmlreports.toml) instead of project config
        #[arg(long)]
        global: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display the current effective configuration
    Show {
        /// Output as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },

    /// Show the paths of the configuration files
    Path,
}

fn main() {
    let args = Args::parse();
    let verbosity = Verbosity::from_flags(args.quiet, args.verbose);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(verbosity.log_filter()))
        .target(env_logger::Target::Stderr)
        .init();

    let code = match run(args.command, verbosity) {
        Ok(status) => status.code(),
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red().bold());
            ExitStatus::Failed.code()
        }
    };
    std::process::exit(code);
}

fn run(command: Commands, verbosity: Verbosity) -> Result<ExitStatus> {
    match command {
        Commands::Report {
            archives,
            reports,
            jobs,
            scratch_dir,
            json,
        } => {
            let config = Config::discover();
            let mut pipeline_config = config.report().apply(PipelineConfig::default());
            // CLI args override config
            if let Some(jobs) = jobs {
                pipeline_config = pipeline_config.with_workers(jobs);
            }
            if let Some(scratch_dir) = scratch_dir {
                pipeline_config = pipeline_config.with_scratch_root(scratch_dir);
            }
            report_command(&archives, &reports, pipeline_config, json, verbosity)
        }
        Commands::Generate {
            output,
            archives,
            documents,
            max_objects,
            seed,
        } => {
            let config = Config::discover();
            let mut generator = config.generate().apply(GeneratorConfig::default());
            if let Some(archives) = archives {
                generator.archives = archives;
            }
            if let Some(documents) = documents {
                generator.documents_per_archive = documents;
            }
            if let Some(max_objects) = max_objects {
                generator.max_objects = max_objects;
            }
            generator.seed = seed;
            generate_command(&output, &generator, verbosity)
        }
        Commands::Config { action } => config_command(action, verbosity),
    }
}

fn spinner(verbosity: Verbosity, message: String) -> ProgressBar {
    if !verbosity.should_show_output() {
        return ProgressBar::hidden();
    }
    let sp = ProgressBar::new_spinner();
    sp.set_style(ProgressStyle::default_spinner());
    sp.set_message(message);
    sp.enable_steady_tick(Duration::from_millis(100));
    sp
}

fn report_command(
    archives: &std::path::Path,
    reports: &std::path::Path,
    pipeline_config: PipelineConfig,
    json: bool,
    verbosity: Verbosity,
) -> Result<ExitStatus> {
    debug!("Pipeline config: {pipeline_config:?}");
    if verbosity == Verbosity::Verbose {
        eprintln!(
            "{} {} workers, scratch root {}",
            "Config:".cyan().bold(),
            pipeline_config.workers,
            pipeline_config.scratch_root.display()
        );
    }

    let sp = spinner(verbosity, format!("Processing {}", archives.display()));
    let summary = Pipeline::new(pipeline_config).run(archives, reports);
    sp.finish_and_clear();

    if json {
        let out = serde_json::to_string_pretty(&summary).context("Failed to serialize run summary")?;
        println!("{out}");
    }
    if verbosity.should_show_output() || summary.state == PipelineState::Failed {
        print_summary(&summary);
    }

    Ok(summary.exit_status())
}

fn print_summary(summary: &RunSummary) {
    match summary.state {
        PipelineState::Done => {
            eprintln!(
                "{} {} archives, {} documents in {:.2}s",
                "Done:".green().bold(),
                summary.archives,
                summary.documents,
                summary.elapsed_secs
            );
            if let Some(path) = &summary.levels_path {
                eprintln!("  levels:  {:>8} rows -> {}", summary.level_rows, path.display());
            }
            if let Some(path) = &summary.objects_path {
                eprintln!("  objects: {:>8} rows -> {}", summary.object_rows, path.display());
            }
        }
        _ => {
            eprintln!(
                "{} {}",
                "Failed:".red().bold(),
                summary.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    if !summary.duplicate_ids.is_empty() {
        eprintln!(
            "{} {} identifiers occur more than once (first: {})",
            "Warning:".yellow().bold(),
            summary.duplicate_ids.len(),
            summary.duplicate_ids[0]
        );
    }
    for warning in &summary.cleanup_warnings {
        eprintln!("{} {warning}", "Warning:".yellow().bold());
    }
}

fn generate_command(
    output: &std::path::Path,
    generator: &GeneratorConfig,
    verbosity: Verbosity,
) -> Result<ExitStatus> {
    debug!("Generator config: {generator:?}");
    let sp = spinner(verbosity, format!("Generating {} archives", generator.archives));
    let result = generate_corpus(output, generator);
    sp.finish_and_clear();
    let archives = result.with_context(|| format!("Failed to generate corpus in {}", output.display()))?;

    if verbosity.should_show_output() {
        eprintln!(
            "{} Generated {} archives with {} documents each in {}",
            "Success:".green().bold(),
            archives.len(),
            generator.documents_per_archive,
            output.display()
        );
    }
    Ok(ExitStatus::Success)
}

fn config_command(action: ConfigAction, verbosity: Verbosity) -> Result<ExitStatus> {
    match action {
        ConfigAction::Init { global, force } => config_init(global, force, verbosity),
        ConfigAction::Show { json } => config_show(json),
        ConfigAction::Path => config_path(),
    }
}

/// Create a new configuration file with commented defaults
fn config_init(global: bool, force: bool, verbosity: Verbosity) -> Result<ExitStatus> {
    let config_path = if global {
        user_config_path().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
    } else {
        project_config_path()
    };

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists: {} (use --force to overwrite)",
            config_path.display()
        );
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

    if verbosity.should_show_output() {
        eprintln!(
            "{} Created configuration file: {}",
            "Success:".green().bold(),
            config_path.display()
        );
    }
    Ok(ExitStatus::Success)
}

/// Display the current effective configuration
fn config_show(json_output: bool) -> Result<ExitStatus> {
    let merged = Config::discover();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&merged)?);
    } else {
        println!("{}", toml::to_string_pretty(&merged)?);
    }
    Ok(ExitStatus::Success)
}

fn config_path() -> Result<ExitStatus> {
    let project = project_config_path();
    let status = |exists: bool| if exists { "exists" } else { "not found" };

    match user_config_path() {
        Some(user) => println!("user:    {} ({})", user.display(), status(user.exists())),
        None => println!("user:    (no home directory)"),
    }
    println!("project: {} ({})", project.display(), status(project.exists()));
    Ok(ExitStatus::Success)
}
