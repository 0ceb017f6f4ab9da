//! Command handlers for the astradb CLI.
//!
//! Each handler calls one manager operation and prints its reply. Handlers
//! return whether the reply was a success so `main` can pick the exit code.

mod bundle;
mod config_cmd;
mod database;
mod output;
mod schema;

pub use bundle::{handle_bundle_config, handle_entries};
pub use config_cmd::handle_config;
pub use database::{handle_delete, handle_list, handle_save, handle_test};
pub use schema::{handle_describe_table, handle_describe_type, handle_schema};
