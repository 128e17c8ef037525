//! CLI argument definitions for the snapshot ingestion runner.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};

#[derive(Parser)]
#[command(
    name = "snap-ingestd",
    version,
    about = "Snapshot ingestion - normalize plugin snapshot files into per-source frames",
    long_about = "Discover plugin snapshot files on disk, normalize them into typed\n\
                  frames stamped with source/snapshot provenance, and emit one frame\n\
                  per source with every declared column reconciled."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run an ingestion session over a snapshot directory.
    Run(RunArgs),

    /// List the registered stages and their backends.
    Stages,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Glob matching the snapshot files to read, e.g.
    /// './input/*/snapshot-*/*.json'.
    #[arg(value_name = "INPUT_GLOB")]
    pub input_glob: String,

    /// Plugin identifiers to accept; files from other plugins are skipped.
    #[arg(long = "plugin", value_name = "NAME", required = true)]
    pub plugins: Vec<String>,

    /// Feature columns to extract, in output order. When omitted every
    /// non-excluded column in each file is kept.
    #[arg(long = "column", value_name = "NAME")]
    pub columns: Vec<String>,

    /// Columns to drop when present.
    #[arg(long = "exclude", value_name = "NAME", default_value = "SHA256")]
    pub excludes: Vec<String>,

    /// Primary text encoding for snapshot files.
    #[arg(long = "encoding", default_value = "latin1")]
    pub encoding: String,

    /// Required-column declarations as a JSON file mapping names to kinds;
    /// missing columns are filled with type-appropriate zero values.
    #[arg(long = "required-columns", value_name = "PATH")]
    pub required_columns: Option<PathBuf>,

    /// Keep watching the directory for new files after the initial scan.
    #[arg(long = "watch")]
    pub watch: bool,

    /// Stop after this many files (-1 for unbounded).
    #[arg(long = "max-files", default_value_t = -1, allow_negative_numbers = true)]
    pub max_files: i64,

    /// Emit files in sorted order.
    #[arg(long = "sort-glob")]
    pub sort_glob: bool,

    /// Do not expand '**' recursively.
    #[arg(long = "no-recursive")]
    pub no_recursive: bool,

    /// Bound on the internal path queue.
    #[arg(long = "queue-size", default_value_t = 128)]
    pub queue_size: usize,

    /// Seconds to spend assembling one batch while watching.
    #[arg(long = "batch-timeout", default_value_t = 5)]
    pub batch_timeout_secs: u64,

    /// Force the portable partition implementation.
    #[arg(long = "portable")]
    pub portable: bool,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
