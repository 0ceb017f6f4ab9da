//! CLI argument parsing structures.

use clap::{Args, Parser};
use std::path::PathBuf;

use super::commands::Commands;

/// Main CLI structure for astradb.
#[derive(Parser, Debug)]
#[command(name = "astradb")]
#[command(version)]
#[command(
    about = "Store, validate and browse Astra DB secure connect bundles",
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Global configuration arguments available to all commands.
#[derive(Debug, Default, Args)]
pub struct ConfigArgs {
    /// Print the raw JSON reply instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    /// Managed storage root (overrides data_dir from astradb.kdl)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Connection probe timeout in milliseconds (overrides probe_timeout_ms)
    #[arg(long, global = true, value_name = "MS")]
    pub timeout_ms: Option<u64>,
}
