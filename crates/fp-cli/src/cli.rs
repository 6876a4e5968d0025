//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Featherprobe - profile datasets into column and dataset statistics
#[derive(Parser, Debug)]
#[command(name = "fp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory containing featherprobe.yml
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override the database path from the config file
    #[arg(long, global = true, env = "FP_DATABASE_PATH")]
    pub database_path: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Profile a table or the result of a query
    Profile(ProfileArgs),

    /// Show the audit trail of a run
    Audit(AuditArgs),
}

/// Arguments for the profile command
#[derive(Args, Debug)]
pub struct ProfileArgs {
    /// Run identifier (default: a random UUID)
    #[arg(long)]
    pub run_id: Option<String>,

    /// Identifier of the dataset being profiled
    #[arg(long)]
    pub dataset_id: String,

    /// Human-readable dataset name
    #[arg(long)]
    pub dataset_name: String,

    /// Database of the source table
    #[arg(long)]
    pub database: Option<String>,

    /// Schema of the source table
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Source table (mutually exclusive with --query)
    #[arg(short, long, conflicts_with = "query")]
    pub table: Option<String>,

    /// Ad-hoc query to profile (mutually exclusive with --table)
    #[arg(short, long)]
    pub query: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Arguments for the audit command
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Run whose steps to show
    #[arg(long)]
    pub run_id: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
