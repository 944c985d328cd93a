//! CLI argument definitions for the workbench auto-mapper.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use wbmap_model::Scope;

#[derive(Parser)]
#[command(
    name = "wbmap",
    version,
    about = "Propose schema mapping paths for spreadsheet column headers",
    long_about = "Propose schema mapping paths for spreadsheet column headers.\n\n\
                  Headers are matched against a collections schema snapshot using\n\
                  shortcuts, table and rank synonyms, and field synonyms."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
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
    /// Map column headers onto schema paths.
    Map(MapArgs),

    /// List the tables of a schema snapshot.
    Tables(SchemaArgs),

    /// Report rule entries that name tables or fields missing from the schema.
    CheckRules(CheckRulesArgs),
}

#[derive(Parser)]
pub struct SchemaArgs {
    /// Schema snapshot (JSON). Falls back to `WBMAP_SCHEMA`.
    #[arg(long = "schema", value_name = "PATH")]
    pub schema: Option<PathBuf>,
}

#[derive(Parser)]
pub struct CheckRulesArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Rule document (JSON). Falls back to `WBMAP_RULES`, then the embedded rules.
    #[arg(long = "rules", value_name = "PATH")]
    pub rules: Option<PathBuf>,
}

#[derive(Parser)]
pub struct MapArgs {
    /// CSV file whose first record is the header row, or `-` to read one header per line from stdin.
    #[arg(value_name = "HEADERS")]
    pub headers: String,

    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Table the upload is rooted at.
    #[arg(long = "base-table", value_name = "NAME")]
    pub base_table: String,

    /// Rule document (JSON). Falls back to `WBMAP_RULES`, then the embedded rules.
    #[arg(long = "rules", value_name = "PATH")]
    pub rules: Option<PathBuf>,

    /// Matching profile.
    #[arg(long = "scope", value_enum, default_value = "automapper")]
    pub scope: ScopeArg,

    /// Table the search starts from (defaults to the base table).
    #[arg(long = "starting-table", value_name = "NAME")]
    pub starting_table: Option<String>,

    /// Path from the base table to the starting table, e.g. `determinations.#1`.
    #[arg(long = "path", value_name = "PATH")]
    pub path: Option<String>,

    /// Leading path segments whose to-many markers are never renumbered.
    #[arg(long = "path-offset", value_name = "N", default_value_t = 0)]
    pub path_offset: usize,

    /// Output format.
    #[arg(long = "output", value_enum, default_value = "table")]
    pub output: OutputArg,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ScopeArg {
    Automapper,
    Suggestion,
}

impl From<ScopeArg> for Scope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Automapper => Scope::AutoMapper,
            ScopeArg::Suggestion => Scope::Suggestion,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputArg {
    Table,
    Json,
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
