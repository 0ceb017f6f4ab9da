//! Command and subcommand definitions.

use clap::Subcommand;
use std::path::PathBuf;

/// Top-level commands available in astradb.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a bundle and credentials, then save them as a named database
    Save {
        /// Path to the secure connect bundle (.zip)
        bundle: PathBuf,

        /// Path to the credentials JSON file
        credentials: PathBuf,

        /// Display name (default: derived from the bundle)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Check a bundle and credentials, connecting live when a token is present
    Test {
        /// Path to the secure connect bundle (.zip)
        bundle: PathBuf,

        /// Path to the credentials JSON file
        credentials: PathBuf,
    },
    /// List the entries of a bundle ("-" reads the bundle from stdin)
    Entries {
        /// Path to the secure connect bundle, or "-"
        bundle: PathBuf,
    },
    /// Print the connection config embedded in a bundle ("-" reads stdin)
    BundleConfig {
        /// Path to the secure connect bundle, or "-"
        bundle: PathBuf,
    },
    /// List saved databases
    List,
    /// Delete a saved database, its bundle copy and its stored credentials
    Delete {
        /// Slug of the database
        slug: String,
    },
    /// Show the tables and types of a saved database's keyspace
    Schema {
        /// Slug of the database
        slug: String,

        /// Only show names containing this text (case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Print the CREATE TABLE statement for a table
    DescribeTable {
        /// Slug of the database
        slug: String,

        /// Table name
        table: String,
    },
    /// Print the CREATE TYPE statement for a user-defined type
    DescribeType {
        /// Slug of the database
        slug: String,

        /// Type name
        #[arg(value_name = "TYPE")]
        type_name: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a config file with default values
    Generate {
        /// Path where to create the config file (default: ~/.config/astradb/astradb.kdl)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite existing config file if it exists
        #[arg(long)]
        overwrite: bool,
    },
    /// Show the effective configuration
    List,
    /// Get a specific configuration value
    Get {
        /// Setting key (e.g., "data_dir", "probe_timeout_ms")
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Setting key
        key: String,
        /// New value
        value: String,
    },
}
