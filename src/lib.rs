//! astradb-manager - store, validate and browse Astra DB secure connect
//! bundles.
//!
//! This crate provides functionality to:
//! - Read entries out of a secure connect bundle, from a path or a buffer
//! - Validate bundles and credentials documents structurally
//! - Probe a live connection under a timeout
//! - Keep a local index of saved databases, with credentials in the OS keychain
//! - Introspect a keyspace and render `CREATE TABLE` / `CREATE TYPE` statements
//!
//! # Example
//!
//! ```no_run
//! use astradb_manager::{Config, DatabaseManager};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load().unwrap_or_default();
//!     let manager = DatabaseManager::from_config(&config);
//!
//!     let reply = manager.list_databases().await;
//!     for db in reply.data().map(|d| d.databases.as_slice()).unwrap_or_default() {
//!         println!("{} ({})", db.name, db.slug);
//!     }
//! }
//! ```

pub mod archive;
pub mod bundle;
pub mod cli;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod driver;
pub mod error;
pub mod manager;
pub mod naming;
pub mod probe;
pub mod schema;
pub mod store;
pub mod utils;

// Re-export commonly used types at the crate root
pub use archive::BundleSource;
pub use config::Config;
pub use error::{ManagerError, Result};
pub use manager::{DatabaseManager, Reply};
pub use store::{DatabaseEntry, MemoryStore, SecretStore};
