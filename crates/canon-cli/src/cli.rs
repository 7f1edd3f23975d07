//! CLI argument definitions.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "canon",
    version,
    about = "Normalize, map, profile and localize clinical resources",
    long_about = "Transform clinical resources into their canonical, tenant-localized form.\n\n\
                  Reads a JSON array of resources, runs every resource through terminology\n\
                  mapping and profile transformation, and writes the results as JSON."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

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
    /// Transform a JSON array of resources for one tenant.
    Transform(TransformArgs),

    /// List the registered profile transformers.
    Profiles,
}

#[derive(Parser)]
pub struct TransformArgs {
    /// JSON file holding an array of resources.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Tenant mnemonic used to localize ids and references.
    #[arg(long = "tenant", value_name = "MNEMONIC")]
    pub tenant: String,

    /// Concept map and value set file (default: no terminology mapping).
    #[arg(long = "concept-map", value_name = "PATH")]
    pub concept_map: Option<PathBuf>,

    /// Reload the concept map if it was loaded before this instant (RFC 3339).
    #[arg(long = "force-reload", value_name = "TIMESTAMP")]
    pub force_reload: Option<DateTime<Utc>>,

    /// Output file (default: <INPUT> with a `.transformed.json` extension).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Transform and report without writing the output file.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Treat mapping warnings as blocking.
    #[arg(long = "strict")]
    pub strict: bool,

    /// Keep the ids of extracted resources as generated.
    #[arg(long = "no-localize-embedded")]
    pub no_localize_embedded: bool,

    /// Do not report warning-only validation results.
    #[arg(long = "no-report-warnings")]
    pub no_report_warnings: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
