//! Saved database commands: save, test, list, delete.

use std::path::Path;

use chrono_humanize::HumanTime;

use super::output::emit;
use crate::error::Result;
use crate::manager::DatabaseManager;

/// Handle the save command - validate and store a bundle with credentials
pub async fn handle_save(
    manager: &DatabaseManager,
    name: Option<&str>,
    bundle: &Path,
    credentials: &Path,
    json: bool,
) -> Result<bool> {
    let reply = manager.save_database(name, bundle, credentials).await;
    emit(&reply, json, |data, _| {
        let db = &data.db;
        println!("Saved '{}' as {}", db.name, db.slug);
        if db.keyspace_name.is_empty() {
            println!("  keyspace: (resolved at connect time)");
        } else {
            println!("  keyspace: {}", db.keyspace_name);
        }
        println!("  bundle:   {}", db.bundle_path.display());
    })
}

/// Handle the test command - structural checks plus an optional live probe
pub async fn handle_test(
    manager: &DatabaseManager,
    bundle: &Path,
    credentials: &Path,
    json: bool,
) -> Result<bool> {
    let reply = manager.test_connection(bundle, credentials).await;
    emit(&reply, json, |_, message| {
        println!("{}", message.unwrap_or("OK"));
    })
}

/// Handle the list command - print saved databases
pub async fn handle_list(manager: &DatabaseManager, json: bool) -> Result<bool> {
    let reply = manager.list_databases().await;
    emit(&reply, json, |data, _| {
        if data.databases.is_empty() {
            eprintln!("No databases saved. Use 'astradb save BUNDLE CREDENTIALS' first.");
            return;
        }

        let name_width = data
            .databases
            .iter()
            .map(|db| db.name.len())
            .max()
            .unwrap_or(4)
            .max(4);
        let slug_width = data
            .databases
            .iter()
            .map(|db| db.slug.len())
            .max()
            .unwrap_or(4)
            .max(4);

        println!(
            "{:<name_width$}  {:<slug_width$}  {:<16}  SAVED",
            "NAME", "SLUG", "KEYSPACE"
        );
        for db in &data.databases {
            let keyspace = if db.keyspace_name.is_empty() {
                "-"
            } else {
                db.keyspace_name.as_str()
            };
            println!(
                "{:<name_width$}  {:<slug_width$}  {:<16}  {}",
                db.name,
                db.slug,
                keyspace,
                HumanTime::from(db.created_at)
            );
        }
    })
}

/// Handle the delete command
pub async fn handle_delete(manager: &DatabaseManager, slug: &str, json: bool) -> Result<bool> {
    let reply = manager.delete_database(slug).await;
    emit(&reply, json, |_, _| {
        println!("Deleted {}", slug);
    })
}
