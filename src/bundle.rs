//! Secure Connect Bundle validation.
//!
//! Validation is shallow on purpose: it checks that the file is a zip and
//! that the expected member files are present, not what they contain.

use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;
use tokio::io::AsyncReadExt;

use crate::archive::{self, BundleSource};
use crate::error::{ManagerError, Result};

/// Base file names every bundle must contain, in display order.
pub const REQUIRED_BUNDLE_FILES: [&str; 8] = [
    "cert.pfx",
    "cqlshrc",
    "config.json",
    "trustStore.jks",
    "identity.jks",
    "cert",
    "key",
    "ca.crt",
];

/// Name of the embedded JSON connection config.
pub const CONFIG_ENTRY: &str = "config.json";

/// Zip signature prefix checked before the archive is opened.
const ZIP_SIGNATURE: &[u8; 2] = b"PK";

/// Run the structural checks on a bundle file, stopping at the first failure.
pub async fn validate_bundle(path: &Path) -> Result<()> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|_| ManagerError::validation(format!("Bundle not found: {}", path.display())))?;
    if !meta.is_file() {
        return Err(ManagerError::validation(format!(
            "Bundle is not a file: {}",
            path.display()
        )));
    }

    if !has_zip_signature(path).await? {
        return Err(ManagerError::validation(
            "Bundle is not a valid zip file (bad signature)",
        ));
    }

    let entries = archive::list_entries(&BundleSource::from(path)).await?;
    let missing = missing_required_files(entries.iter().map(String::as_str));
    if !missing.is_empty() {
        return Err(ManagerError::validation(format!(
            "Bundle is missing required files: {}",
            missing.join(", ")
        )));
    }

    Ok(())
}

/// Whether the first bytes of the file carry the zip signature.
async fn has_zip_signature(path: &Path) -> Result<bool> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut header = [0u8; 4];
    let mut read = 0;
    while read < header.len() {
        let n = file.read(&mut header[read..]).await?;
        if n == 0 {
            break;
        }
        read += n;
    }
    Ok(read >= ZIP_SIGNATURE.len() && header.starts_with(ZIP_SIGNATURE))
}

/// Required file names absent from `entries`, in [`REQUIRED_BUNDLE_FILES`] order.
///
/// Entries are compared by basename, so nested layouts are accepted.
pub fn missing_required_files<'a>(entries: impl IntoIterator<Item = &'a str>) -> Vec<&'static str> {
    let present: HashSet<&str> = entries.into_iter().map(archive::basename).collect();
    REQUIRED_BUNDLE_FILES
        .iter()
        .copied()
        .filter(|name| !present.contains(name))
        .collect()
}

/// Read and parse the bundle's embedded `config.json`.
///
/// Returns `Ok(None)` when the bundle has no such entry. A present but
/// malformed config is a validation error.
pub async fn read_bundle_config(source: &BundleSource) -> Result<Option<Value>> {
    let Some(text) = archive::read_entry_text(source, CONFIG_ENTRY).await? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&text)
        .map_err(|e| ManagerError::validation(format!("config.json is not valid JSON: {}", e)))?;
    Ok(Some(value))
}
