//! Keyspace introspection and CQL definition rendering.
//!
//! The functions here take an already-open [`CqlSession`]; opening and
//! closing it is the caller's job (see `manager`).

use std::path::Path;

use serde::Serialize;

use crate::driver::{CqlSession, KeyspaceMetadata, TableMetadata, UdtMetadata};
use crate::error::{ManagerError, Result};
use crate::naming::derive_keyspace;

/// Table and type names of one keyspace, each sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaSummary {
    pub keyspace: String,
    pub tables: Vec<String>,
    pub types: Vec<String>,
}

/// Pick the working keyspace: the stored one, then the session's, then a
/// fresh read of the bundle config. First non-empty wins.
pub async fn resolve_keyspace(
    stored: &str,
    session: &dyn CqlSession,
    bundle_path: &Path,
) -> Option<String> {
    if !stored.trim().is_empty() {
        return Some(stored.trim().to_string());
    }
    if let Some(ks) = session.active_keyspace().filter(|k| !k.trim().is_empty()) {
        return Some(ks);
    }
    let derived = derive_keyspace(bundle_path).await;
    (!derived.is_empty()).then_some(derived)
}

/// Fetch metadata for `keyspace`, failing when it does not exist.
pub async fn load_keyspace(session: &dyn CqlSession, keyspace: &str) -> Result<KeyspaceMetadata> {
    session
        .keyspace_metadata(keyspace)
        .await?
        .ok_or_else(|| ManagerError::not_found(format!("Keyspace '{}' not found", keyspace)))
}

/// Sorted table and type names.
pub fn summarize(keyspace: &KeyspaceMetadata) -> SchemaSummary {
    let mut tables: Vec<String> = keyspace.tables.keys().map(str::to_string).collect();
    let mut types: Vec<String> = keyspace.types.keys().map(str::to_string).collect();
    tables.sort();
    types.sort();
    SchemaSummary {
        keyspace: keyspace.name.clone(),
        tables,
        types,
    }
}

/// Look up a table, exact name first then case-insensitively.
pub fn find_table<'a>(keyspace: &'a KeyspaceMetadata, name: &str) -> Result<&'a TableMetadata> {
    keyspace.tables.get(name, true).ok_or_else(|| {
        ManagerError::not_found(format!(
            "Table '{}' not found in keyspace '{}'",
            name, keyspace.name
        ))
    })
}

/// Look up a user-defined type, exact name first then case-insensitively.
pub fn find_type<'a>(keyspace: &'a KeyspaceMetadata, name: &str) -> Result<&'a UdtMetadata> {
    keyspace.types.get(name, true).ok_or_else(|| {
        ManagerError::not_found(format!(
            "Type '{}' not found in keyspace '{}'",
            name, keyspace.name
        ))
    })
}

/// Render a `CREATE TABLE` statement.
///
/// Columns keep their declared order. A single partition key column is
/// written bare, several are parenthesized; clustering columns follow.
pub fn render_create_table(keyspace: &str, table: &TableMetadata) -> String {
    let mut lines: Vec<String> = table
        .columns
        .iter()
        .map(|c| format!("  {} {}", c.name, c.cql_type))
        .collect();

    let partition = match table.partition_key.as_slice() {
        [single] => single.clone(),
        many => format!("({})", many.join(", ")),
    };
    let mut key_parts = vec![partition];
    key_parts.extend(table.clustering_key.iter().cloned());
    lines.push(format!("  PRIMARY KEY ({})", key_parts.join(", ")));

    format!(
        "CREATE TABLE {}.{} (\n{}\n);",
        keyspace,
        table.name,
        lines.join(",\n")
    )
}

/// Render a `CREATE TYPE` statement with fields in declared order.
pub fn render_create_type(keyspace: &str, udt: &UdtMetadata) -> String {
    let fields: Vec<String> = udt
        .fields
        .iter()
        .map(|f| format!("  {} {}", f.name, f.cql_type))
        .collect();
    format!(
        "CREATE TYPE {}.{} (\n{}\n);",
        keyspace,
        udt.name,
        fields.join(",\n")
    )
}

/// Names containing `query`, case-insensitively. A blank query keeps all.
pub fn filter_names<'a>(names: &'a [String], query: &str) -> Vec<&'a str> {
    let needle = query.trim().to_lowercase();
    names
        .iter()
        .map(String::as_str)
        .filter(|n| needle.is_empty() || n.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{ColumnMetadata, NamedCollection};
    use async_trait::async_trait;

    fn table(name: &str, cols: &[(&str, &str)], pk: &[&str], ck: &[&str]) -> TableMetadata {
        TableMetadata {
            name: name.to_string(),
            columns: cols.iter().map(|(n, t)| ColumnMetadata::new(*n, *t)).collect(),
            partition_key: pk.iter().map(|s| s.to_string()).collect(),
            clustering_key: ck.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_render_create_table_single_partition_key() {
        let t = table(
            "t",
            &[("id", "uuid"), ("ts", "timestamp"), ("val", "text")],
            &["id"],
            &["ts"],
        );
        assert_eq!(
            render_create_table("ks", &t),
            "CREATE TABLE ks.t (\n  id uuid,\n  ts timestamp,\n  val text,\n  PRIMARY KEY (id, ts)\n);"
        );
    }

    #[test]
    fn test_render_create_table_composite_partition_key() {
        let t = table(
            "events",
            &[("tenant", "text"), ("day", "date"), ("ts", "timeuuid"), ("seq", "int"), ("body", "blob")],
            &["tenant", "day"],
            &["ts", "seq"],
        );
        assert_eq!(
            render_create_table("app", &t),
            "CREATE TABLE app.events (\n  tenant text,\n  day date,\n  ts timeuuid,\n  seq int,\n  body blob,\n  PRIMARY KEY ((tenant, day), ts, seq)\n);"
        );
    }

    #[test]
    fn test_render_create_table_keeps_declared_order() {
        let t = table("t", &[("z", "int"), ("a", "int")], &["z"], &[]);
        assert_eq!(
            render_create_table("ks", &t),
            "CREATE TABLE ks.t (\n  z int,\n  a int,\n  PRIMARY KEY (z)\n);"
        );
    }

    #[test]
    fn test_render_create_type() {
        let udt = UdtMetadata {
            name: "address".into(),
            fields: vec![
                ColumnMetadata::new("street", "text"),
                ColumnMetadata::new("zip", "int"),
            ],
        };
        assert_eq!(
            render_create_type("ks", &udt),
            "CREATE TYPE ks.address (\n  street text,\n  zip int\n);"
        );
    }

    #[test]
    fn test_filter_names() {
        let tables: Vec<String> = ["users", "orders", "events"].iter().map(|s| s.to_string()).collect();
        assert_eq!(filter_names(&tables, "us"), vec!["users"]);
        assert_eq!(filter_names(&tables, "ER"), vec!["users", "orders"]);
        assert_eq!(filter_names(&tables, " ").len(), 3);

        let types: Vec<String> = ["address", "profile"].iter().map(|s| s.to_string()).collect();
        assert_eq!(filter_names(&types, "pro"), vec!["profile"]);
    }

    fn keyspace() -> KeyspaceMetadata {
        let mut tables = NamedCollection::new();
        tables.insert("Users", table("Users", &[("id", "uuid")], &["id"], &[]));
        tables.insert("accounts", table("accounts", &[("id", "uuid")], &["id"], &[]));
        let mut types = NamedCollection::new();
        types.insert("profile", UdtMetadata { name: "profile".into(), fields: vec![] });
        KeyspaceMetadata {
            name: "shop".into(),
            tables,
            types,
        }
    }

    #[test]
    fn test_summarize_sorts_names() {
        let summary = summarize(&keyspace());
        assert_eq!(summary.keyspace, "shop");
        assert_eq!(summary.tables, vec!["Users", "accounts"]);
        assert_eq!(summary.types, vec!["profile"]);
    }

    #[test]
    fn test_find_table_case_fallback_and_not_found() {
        let ks = keyspace();
        assert_eq!(find_table(&ks, "users").unwrap().name, "Users");
        let err = find_table(&ks, "orders").unwrap_err();
        assert_eq!(err.to_string(), "Table 'orders' not found in keyspace 'shop'");
        let err = find_type(&ks, "address").unwrap_err();
        assert_eq!(err.to_string(), "Type 'address' not found in keyspace 'shop'");
    }

    struct KeyspaceSession(Option<String>);

    #[async_trait]
    impl CqlSession for KeyspaceSession {
        async fn ping(&self) -> Result<()> {
            Ok(())
        }
        fn active_keyspace(&self) -> Option<String> {
            self.0.clone()
        }
        async fn keyspace_metadata(&self, _: &str) -> Result<Option<KeyspaceMetadata>> {
            Ok(None)
        }
        async fn shutdown(self: Box<Self>) {}
    }

    #[tokio::test]
    async fn test_resolve_keyspace_precedence() {
        let bundle = Path::new("/nonexistent.zip");
        let session = KeyspaceSession(Some("live".into()));
        assert_eq!(resolve_keyspace("stored", &session, bundle).await.as_deref(), Some("stored"));
        assert_eq!(resolve_keyspace("", &session, bundle).await.as_deref(), Some("live"));

        let session = KeyspaceSession(None);
        assert_eq!(resolve_keyspace("", &session, bundle).await, None);
    }

    #[tokio::test]
    async fn test_load_keyspace_not_found() {
        let err = load_keyspace(&KeyspaceSession(None), "ghost").await.unwrap_err();
        assert_eq!(err.to_string(), "Keyspace 'ghost' not found");
    }
}
