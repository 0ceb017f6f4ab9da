//! CQL driver implementation of the connection seam.
//!
//! Contact point and TLS identity both come from the bundle:
//! `config.json` supplies `host`, `cql_port` and the default keyspace, and the
//! PEM entries `ca.crt`, `cert` and `key` become the OpenSSL context.
//! Metadata is read from `system_schema`.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use openssl::pkey::PKey;
use openssl::ssl::{SslContext, SslMethod, SslVerifyMode};
use openssl::x509::X509;
use scylla::{Session, SessionBuilder};

use super::{
    ColumnMetadata, Connector, CqlSession, KeyspaceMetadata, NamedCollection, TOKEN_USERNAME,
    TableMetadata, UdtMetadata,
};
use crate::archive::{self, BundleSource};
use crate::bundle::read_bundle_config;
use crate::error::{ManagerError, Result};
use crate::naming::keyspace_from_config;

/// CQL port used when the bundle config does not name one.
const DEFAULT_CQL_PORT: u64 = 29042;

const LIVENESS_QUERY: &str = "SELECT release_version FROM system.local";
const KEYSPACE_QUERY: &str =
    "SELECT keyspace_name FROM system_schema.keyspaces WHERE keyspace_name = ?";
const TABLES_QUERY: &str = "SELECT table_name FROM system_schema.tables WHERE keyspace_name = ?";
const COLUMNS_QUERY: &str = "SELECT table_name, column_name, kind, position, type \
     FROM system_schema.columns WHERE keyspace_name = ?";
const TYPES_QUERY: &str =
    "SELECT type_name, field_names, field_types FROM system_schema.types WHERE keyspace_name = ?";

/// Connector backed by the `scylla` CQL driver.
#[derive(Debug)]
pub struct ScyllaConnector {
    _private: (),
}

impl Default for ScyllaConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl ScyllaConnector {
    pub fn new() -> Self {
        openssl::init();
        Self { _private: () }
    }
}

/// What the driver needs out of a bundle.
struct BundleEndpoint {
    contact_point: String,
    keyspace: Option<String>,
    tls: SslContext,
}

async fn read_pem(source: &BundleSource, name: &str) -> Result<String> {
    archive::read_entry_text(source, name)
        .await?
        .ok_or_else(|| ManagerError::validation(format!("Bundle has no {} entry", name)))
}

async fn load_endpoint(bundle_path: &Path) -> Result<BundleEndpoint> {
    let data = tokio::fs::read(bundle_path).await.map_err(|e| {
        ManagerError::archive(format!("Cannot read bundle {}: {}", bundle_path.display(), e))
    })?;
    let source = BundleSource::Buffer(Bytes::from(data));

    let config = read_bundle_config(&source)
        .await?
        .ok_or_else(|| ManagerError::validation("Bundle has no config.json"))?;
    let host = config
        .get("host")
        .and_then(|v| v.as_str())
        .filter(|h| !h.trim().is_empty())
        .ok_or_else(|| ManagerError::validation("Bundle config.json has no host"))?;
    let port = config
        .get("cql_port")
        .and_then(|v| v.as_u64())
        .unwrap_or(DEFAULT_CQL_PORT);

    let ca = read_pem(&source, "ca.crt").await?;
    let cert = read_pem(&source, "cert").await?;
    let key = read_pem(&source, "key").await?;

    Ok(BundleEndpoint {
        contact_point: format!("{}:{}", host.trim(), port),
        keyspace: keyspace_from_config(&config),
        tls: build_tls_context(&ca, &cert, &key)?,
    })
}

/// Mutual-TLS context trusting the bundle CA and presenting the bundle
/// client certificate.
fn build_tls_context(ca_pem: &str, cert_pem: &str, key_pem: &str) -> Result<SslContext> {
    let tls_err = |e: openssl::error::ErrorStack| {
        ManagerError::validation(format!("Bundle TLS material is unusable: {}", e))
    };

    let mut builder = SslContext::builder(SslMethod::tls()).map_err(tls_err)?;
    let ca = X509::from_pem(ca_pem.as_bytes()).map_err(tls_err)?;
    builder.cert_store_mut().add_cert(ca).map_err(tls_err)?;
    let cert = X509::from_pem(cert_pem.as_bytes()).map_err(tls_err)?;
    builder.set_certificate(&cert).map_err(tls_err)?;
    let key = PKey::private_key_from_pem(key_pem.as_bytes()).map_err(tls_err)?;
    builder.set_private_key(&key).map_err(tls_err)?;
    builder.set_verify(SslVerifyMode::PEER);
    Ok(builder.build())
}

#[async_trait]
impl Connector for ScyllaConnector {
    async fn connect(&self, bundle_path: &Path, token: &str) -> Result<Box<dyn CqlSession>> {
        let endpoint = load_endpoint(bundle_path).await?;
        tracing::debug!(contact_point = %endpoint.contact_point, "opening CQL session");

        let mut builder = SessionBuilder::new()
            .known_node(&endpoint.contact_point)
            .user(TOKEN_USERNAME, token)
            .ssl_context(Some(endpoint.tls));
        if let Some(ks) = &endpoint.keyspace {
            builder = builder.use_keyspace(ks, false);
        }

        let session = builder.build().await.map_err(ManagerError::driver)?;
        Ok(Box::new(ScyllaSession {
            session,
            keyspace: endpoint.keyspace,
        }))
    }
}

struct ScyllaSession {
    session: Session,
    keyspace: Option<String>,
}

impl ScyllaSession {
    async fn keyspace_exists(&self, keyspace: &str) -> Result<bool> {
        let result = self
            .session
            .query_unpaged(KEYSPACE_QUERY, (keyspace.to_string(),))
            .await
            .map_err(ManagerError::driver)?;
        Ok(!result.rows_or_empty().is_empty())
    }

    async fn table_names(&self, keyspace: &str) -> Result<Vec<String>> {
        let result = self
            .session
            .query_unpaged(TABLES_QUERY, (keyspace.to_string(),))
            .await
            .map_err(ManagerError::driver)?;
        let mut names = Vec::new();
        for row in result.rows_typed::<(String,)>().map_err(ManagerError::driver)? {
            let (name,) = row.map_err(ManagerError::driver)?;
            names.push(name);
        }
        Ok(names)
    }

    async fn column_rows(&self, keyspace: &str) -> Result<Vec<ColumnRow>> {
        let result = self
            .session
            .query_unpaged(COLUMNS_QUERY, (keyspace.to_string(),))
            .await
            .map_err(ManagerError::driver)?;
        let mut rows = Vec::new();
        for row in result
            .rows_typed::<(String, String, String, i32, String)>()
            .map_err(ManagerError::driver)?
        {
            let (table, name, kind, position, cql_type) = row.map_err(ManagerError::driver)?;
            rows.push(ColumnRow {
                table,
                name,
                kind,
                position,
                cql_type,
            });
        }
        Ok(rows)
    }

    async fn udts(&self, keyspace: &str) -> Result<Vec<UdtMetadata>> {
        let result = self
            .session
            .query_unpaged(TYPES_QUERY, (keyspace.to_string(),))
            .await
            .map_err(ManagerError::driver)?;
        let mut types = Vec::new();
        for row in result
            .rows_typed::<(String, Vec<String>, Vec<String>)>()
            .map_err(ManagerError::driver)?
        {
            let (name, field_names, field_types) = row.map_err(ManagerError::driver)?;
            let fields = field_names
                .into_iter()
                .zip(field_types)
                .map(|(n, t)| ColumnMetadata::new(n, t))
                .collect();
            types.push(UdtMetadata { name, fields });
        }
        Ok(types)
    }
}

/// One row of `system_schema.columns`.
#[derive(Debug, Clone)]
struct ColumnRow {
    table: String,
    name: String,
    kind: String,
    position: i32,
    cql_type: String,
}

/// Assemble a table from its catalog rows.
///
/// Declared order is partition key (by position), clustering key (by
/// position), static columns, then regular columns in catalog order.
fn assemble_table(name: String, mut rows: Vec<ColumnRow>) -> TableMetadata {
    let rank = |kind: &str| match kind {
        "partition_key" => 0,
        "clustering" => 1,
        "static" => 2,
        _ => 3,
    };
    // Stable sort keeps catalog order within the regular/static groups.
    rows.sort_by_key(|r| {
        let r_rank = rank(&r.kind);
        let pos = if r_rank < 2 { r.position } else { 0 };
        (r_rank, pos)
    });

    let partition_key = rows
        .iter()
        .filter(|r| r.kind == "partition_key")
        .map(|r| r.name.clone())
        .collect();
    let clustering_key = rows
        .iter()
        .filter(|r| r.kind == "clustering")
        .map(|r| r.name.clone())
        .collect();
    let columns = rows
        .into_iter()
        .map(|r| ColumnMetadata::new(r.name, r.cql_type))
        .collect();

    TableMetadata {
        name,
        columns,
        partition_key,
        clustering_key,
    }
}

#[async_trait]
impl CqlSession for ScyllaSession {
    async fn ping(&self) -> Result<()> {
        self.session
            .query_unpaged(LIVENESS_QUERY, ())
            .await
            .map_err(ManagerError::driver)?;
        Ok(())
    }

    fn active_keyspace(&self) -> Option<String> {
        self.keyspace.clone()
    }

    async fn keyspace_metadata(&self, keyspace: &str) -> Result<Option<KeyspaceMetadata>> {
        if !self.keyspace_exists(keyspace).await? {
            return Ok(None);
        }

        let mut by_table: HashMap<String, Vec<ColumnRow>> = HashMap::new();
        for row in self.column_rows(keyspace).await? {
            by_table.entry(row.table.clone()).or_default().push(row);
        }

        let mut tables = NamedCollection::new();
        for name in self.table_names(keyspace).await? {
            let rows = by_table.remove(&name).unwrap_or_default();
            tables.insert(name.clone(), assemble_table(name, rows));
        }

        let types = self
            .udts(keyspace)
            .await?
            .into_iter()
            .map(|udt| (udt.name.clone(), udt))
            .collect();

        Ok(Some(KeyspaceMetadata {
            name: keyspace.to_string(),
            tables,
            types,
        }))
    }

    async fn shutdown(self: Box<Self>) {
        // Dropping the session closes its connection pool.
        tracing::debug!("closing CQL session");
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, kind: &str, position: i32, ty: &str) -> ColumnRow {
        ColumnRow {
            table: "t".into(),
            name: name.into(),
            kind: kind.into(),
            position,
            cql_type: ty.into(),
        }
    }

    #[test]
    fn test_assemble_table_orders_keys_first() {
        // Catalog rows arrive ordered by column name.
        let rows = vec![
            row("amount", "regular", -1, "decimal"),
            row("day", "partition_key", 1, "date"),
            row("id", "partition_key", 0, "uuid"),
            row("note", "static", -1, "text"),
            row("seq", "clustering", 1, "int"),
            row("ts", "clustering", 0, "timestamp"),
            row("val", "regular", -1, "text"),
        ];
        let table = assemble_table("t".into(), rows);

        assert_eq!(table.partition_key, vec!["id", "day"]);
        assert_eq!(table.clustering_key, vec!["ts", "seq"]);
        let names: Vec<_> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "day", "ts", "seq", "note", "amount", "val"]);
    }

    #[tokio::test]
    async fn test_connect_rejects_missing_bundle() {
        let connector = ScyllaConnector::new();
        let err = connector
            .connect(Path::new("/nonexistent/secure-connect.zip"), "tok")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ManagerError::Archive(_)));
        assert!(!err.to_string().contains("tok"));
    }
}
