//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    case::CaseCommands, collection::CollectionCommands, completions::CompletionsArgs,
    fetch::FetchArgs, history::HistoryArgs, import::ImportArgs, latest::LatestArgs,
    record::RecordCommands, report::ReportArgs, stats::StatsArgs,
};

#[derive(Parser)]
#[command(name = "qtl")]
#[command(author, version, about = "QA Test Logger")]
#[command(long_about = "A local record keeper for manual test execution: test cases, execution results, screenshots and filtered reports.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Data directory holding the database and settings
    #[arg(long, global = true, env = "QTL_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import test cases from a CSV export
    Import(ImportArgs),

    /// Fetch test cases from the remote case service
    Fetch(FetchArgs),

    /// Test case management
    #[command(subcommand)]
    Case(CaseCommands),

    /// Collection management (cases imported together)
    #[command(subcommand)]
    Collection(CollectionCommands),

    /// Execution record management
    #[command(subcommand)]
    Record(RecordCommands),

    /// Execution history with filters
    History(HistoryArgs),

    /// Pass/fail statistics
    Stats(StatsArgs),

    /// Latest record of every case
    Latest(LatestArgs),

    /// Write a report file (CSV spreadsheet or Markdown document)
    Report(ReportArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Just IDs, one per line
    Id,
}
