//! Connection seam between the manager and the remote database.
//!
//! The manager only talks to [`Connector`] and [`CqlSession`]. The shipped
//! implementation is [`ScyllaConnector`]; tests substitute their own.
//!
//! Sessions are never pooled: every operation connects, does its work, and
//! calls [`CqlSession::shutdown`] before returning, whatever the outcome.

mod cql;
mod metadata;

pub use cql::ScyllaConnector;
pub use metadata::{ColumnMetadata, KeyspaceMetadata, NamedCollection, TableMetadata, UdtMetadata};

use std::path::Path;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;

use crate::error::Result;

/// Username sent alongside a bearer token.
pub const TOKEN_USERNAME: &str = "token";

/// Opens sessions against the database described by a bundle.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect using the bundle's trust material and `token` as the password
    /// for [`TOKEN_USERNAME`].
    async fn connect(&self, bundle_path: &Path, token: &str) -> Result<Box<dyn CqlSession>>;
}

/// A live session. Callers must call [`CqlSession::shutdown`] when done.
#[async_trait]
pub trait CqlSession: Send + Sync {
    /// Run a minimal read-only query. Any response counts as alive.
    async fn ping(&self) -> Result<()>;

    /// Keyspace the session is bound to, if any.
    fn active_keyspace(&self) -> Option<String>;

    /// Fetch table and type metadata for `keyspace`. `Ok(None)` when the
    /// keyspace does not exist.
    async fn keyspace_metadata(&self, keyspace: &str) -> Result<Option<KeyspaceMetadata>>;

    /// Best-effort teardown; never fails.
    async fn shutdown(self: Box<Self>);
}

static DEFAULT_CONNECTOR: OnceLock<Arc<ScyllaConnector>> = OnceLock::new();

/// The process-wide driver-backed connector.
///
/// Driver initialisation (OpenSSL setup included) happens on the first call
/// and never again.
pub fn default_connector() -> Arc<dyn Connector> {
    let connector = DEFAULT_CONNECTOR.get_or_init(|| {
        tracing::debug!("initialising CQL driver");
        Arc::new(ScyllaConnector::new())
    });
    connector.clone()
}
