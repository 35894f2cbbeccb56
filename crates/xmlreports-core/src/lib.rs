//! Parallel archive-to-CSV reporting for xmlreports
//!
//! Takes a directory of ZIP archives, each holding small XML documents, and
//! produces two CSV tables:
//!
//! - **levels**: one `id,level` row per document
//! - **objects**: one `id,object` row per object per document
//!
//! A run goes through four stages on one shared worker pool:
//!
//! 1. **Extracting**: every archive is unpacked into its own scratch directory
//! 2. **Parsing**: every extracted document becomes a [`DocumentRecord`]
//! 3. **Writing**: both tables are written and swapped into place
//! 4. **CleaningUp**: every scratch directory is removed
//!
//! Extraction and parsing are fail-fast: the first error stops new tasks from
//! being dispatched, no report is written, and cleanup still runs.
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use xmlreports_core::{Pipeline, PipelineConfig, PipelineState};
//!
//! let config = PipelineConfig::default().with_workers(4);
//! let summary = Pipeline::new(config).run(Path::new("archives"), Path::new("reports"));
//!
//! if summary.state == PipelineState::Done {
//!     println!("{} documents, {} objects", summary.level_rows, summary.object_rows);
//! }
//! std::process::exit(summary.exit_status().code());
//! ```
//!
//! # Generating input
//!
//! ```no_run
//! use std::path::Path;
//! use xmlreports_core::{generate_corpus, GeneratorConfig};
//!
//! let config = GeneratorConfig {
//!     seed: Some(7),
//!     ..GeneratorConfig::default()
//! };
//! let archives = generate_corpus(Path::new("archives"), &config).unwrap();
//! println!("{} archives", archives.len());
//! ```

pub mod cleanup;
pub mod config;
pub mod error;
pub mod extraction;
pub mod generator;
pub mod parser;
pub mod parsing;
pub mod pipeline;
pub mod pool;
pub mod record;
pub mod report;

pub use cleanup::{cleanup_all, remove_scratch_dir};
pub use config::PipelineConfig;
pub use error::{CleanupError, ExtractError, GenerateError, ParseError, PipelineError, WriteError};
pub use extraction::{extract_all, plan_jobs, ArchiveJob, ExtractionOutcome};
pub use generator::{document_xml, generate_corpus, write_archive, GeneratorConfig, RecordGenerator};
pub use parser::{parse_document, parse_document_str};
pub use parsing::{duplicate_ids, parse_all};
pub use pipeline::{discover_archives, run_extract_and_report, ExitStatus, Pipeline, PipelineState, RunSummary};
pub use pool::WorkerPool;
pub use record::{DocumentRecord, LevelRow, ObjectRow};
pub use report::{write_reports, ReportStats};
