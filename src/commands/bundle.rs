//! Bundle inspection commands. A path of "-" reads the bundle from stdin.

use std::path::Path;

use bytes::Bytes;
use tokio::io::AsyncReadExt;

use super::output::emit;
use crate::archive::BundleSource;
use crate::error::Result;
use crate::manager::DatabaseManager;

async fn bundle_source(path: &Path) -> Result<BundleSource> {
    if path != Path::new("-") {
        return Ok(BundleSource::from(path));
    }
    let mut buf = Vec::new();
    tokio::io::stdin().read_to_end(&mut buf).await?;
    Ok(BundleSource::Buffer(Bytes::from(buf)))
}

/// Handle the entries command - list every entry path in the bundle
pub async fn handle_entries(manager: &DatabaseManager, bundle: &Path, json: bool) -> Result<bool> {
    let source = bundle_source(bundle).await?;
    let reply = manager.list_bundle_entries(source).await;
    emit(&reply, json, |data, _| {
        for entry in &data.entries {
            println!("{}", entry);
        }
    })
}

/// Handle the bundle-config command - print the embedded config.json
pub async fn handle_bundle_config(
    manager: &DatabaseManager,
    bundle: &Path,
    json: bool,
) -> Result<bool> {
    let source = bundle_source(bundle).await?;
    let reply = manager.get_bundle_config(source).await;
    let pretty = match reply.data() {
        Some(data) => serde_json::to_string_pretty(&data.config)?,
        None => String::new(),
    };
    emit(&reply, json, |_, _| println!("{}", pretty))
}
