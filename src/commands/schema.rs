//! Schema browsing commands.

use super::output::emit;
use crate::error::Result;
use crate::manager::DatabaseManager;
use crate::schema::filter_names;

/// Handle the schema command - list tables and types, optionally filtered
pub async fn handle_schema(
    manager: &DatabaseManager,
    slug: &str,
    filter: Option<&str>,
    json: bool,
) -> Result<bool> {
    let mut reply = manager.get_schema(slug).await;
    if let (Some(query), Some(summary)) = (filter, reply.data.as_mut()) {
        summary.tables = owned(filter_names(&summary.tables, query));
        summary.types = owned(filter_names(&summary.types, query));
    }

    emit(&reply, json, |summary, _| {
        println!("Keyspace: {}", summary.keyspace);
        println!();
        println!("Tables ({}):", summary.tables.len());
        for table in &summary.tables {
            println!("  {}", table);
        }
        println!();
        println!("Types ({}):", summary.types.len());
        for udt in &summary.types {
            println!("  {}", udt);
        }
    })
}

fn owned(names: Vec<&str>) -> Vec<String> {
    names.into_iter().map(str::to_string).collect()
}

/// Handle the describe-table command
pub async fn handle_describe_table(
    manager: &DatabaseManager,
    slug: &str,
    table: &str,
    json: bool,
) -> Result<bool> {
    let reply = manager.describe_table(slug, table).await;
    emit(&reply, json, |data, _| println!("{}", data.create_cql))
}

/// Handle the describe-type command
pub async fn handle_describe_type(
    manager: &DatabaseManager,
    slug: &str,
    type_name: &str,
    json: bool,
) -> Result<bool> {
    let reply = manager.describe_type(slug, type_name).await;
    emit(&reply, json, |data, _| println!("{}", data.create_cql))
}
