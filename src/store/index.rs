//! The on-disk index of saved databases (`databases/dbs.json`).
//!
//! The index is a JSON array rewritten in full on every mutation. There is
//! no locking: concurrent writers race and the last one wins.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ManagerError, Result};

/// Directory under the managed root holding the index and bundle copies.
pub const DATABASES_DIR: &str = "databases";
/// Index file name inside [`DATABASES_DIR`].
pub const INDEX_FILE: &str = "dbs.json";
/// File name of the bundle copy inside each entry directory.
pub const BUNDLE_FILE: &str = "secure-connect.zip";

/// A saved database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseEntry {
    pub name: String,
    pub slug: String,
    pub bundle_path: PathBuf,
    #[serde(default)]
    pub keyspace_name: String,
    pub created_at: DateTime<Utc>,
}

/// Paths of the managed storage layout under one root.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn databases_dir(&self) -> PathBuf {
        self.root.join(DATABASES_DIR)
    }

    pub fn index_path(&self) -> PathBuf {
        self.databases_dir().join(INDEX_FILE)
    }

    /// Directory owned by the entry with `slug`.
    pub fn entry_dir(&self, slug: &str) -> PathBuf {
        self.databases_dir().join(slug)
    }

    /// Where the bundle copy for `slug` lives.
    pub fn bundle_path(&self, slug: &str) -> PathBuf {
        self.entry_dir(slug).join(BUNDLE_FILE)
    }
}

/// In-memory view of the index file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseIndex {
    entries: Vec<DatabaseEntry>,
}

impl DatabaseIndex {
    /// Load the index. A missing file is an empty index; an unparsable one
    /// is an error so it never gets overwritten by accident.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ManagerError::persistence(format!(
                    "Cannot read {}: {}",
                    path.display(),
                    e
                )));
            }
        };
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let entries = serde_json::from_str(&text).map_err(|e| {
            ManagerError::persistence(format!("Database index {} is corrupt: {}", path.display(), e))
        })?;
        Ok(Self { entries })
    }

    /// Write the whole index, replacing the previous file atomically.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let persist_err = |e: std::io::Error| {
            ManagerError::persistence(format!("Cannot write {}: {}", path.display(), e))
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(persist_err)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(persist_err)?;
        if let Err(e) = crate::utils::restrict_file_permissions(&tmp) {
            tracing::warn!(path = %tmp.display(), error = %e, "failed to restrict index permissions");
        }
        tokio::fs::rename(&tmp, path).await.map_err(persist_err)?;
        Ok(())
    }

    pub fn entries(&self) -> &[DatabaseEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<DatabaseEntry> {
        self.entries
    }

    pub fn find(&self, slug: &str) -> Option<&DatabaseEntry> {
        self.entries.iter().find(|e| e.slug == slug)
    }

    /// Add `entry`, replacing any entry with the same slug in place.
    /// Returns the replaced entry.
    pub fn upsert(&mut self, entry: DatabaseEntry) -> Option<DatabaseEntry> {
        match self.entries.iter_mut().find(|e| e.slug == entry.slug) {
            Some(slot) => Some(std::mem::replace(slot, entry)),
            None => {
                self.entries.push(entry);
                None
            }
        }
    }

    /// Remove the entry with `slug`, returning it if it existed.
    pub fn remove(&mut self, slug: &str) -> Option<DatabaseEntry> {
        let pos = self.entries.iter().position(|e| e.slug == slug)?;
        Some(self.entries.remove(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, slug: &str) -> DatabaseEntry {
        DatabaseEntry {
            name: name.to_string(),
            slug: slug.to_string(),
            bundle_path: PathBuf::from(format!("/data/databases/{}/secure-connect.zip", slug)),
            keyspace_name: String::new(),
            created_at: Utc::now(),
        }
    }

    fn scratch_index() -> PathBuf {
        std::env::temp_dir()
            .join(format!(
                "astradb-index-test-{}-{}",
                std::process::id(),
                Utc::now().timestamp_nanos_opt().unwrap_or_default()
            ))
            .join(INDEX_FILE)
    }

    #[test]
    fn test_layout() {
        let layout = StorageLayout::new("/data");
        assert_eq!(layout.index_path(), PathBuf::from("/data/databases/dbs.json"));
        assert_eq!(
            layout.bundle_path("shop"),
            PathBuf::from("/data/databases/shop/secure-connect.zip")
        );
    }

    #[test]
    fn test_upsert_replaces_same_slug() {
        let mut index = DatabaseIndex::default();
        assert!(index.upsert(entry("Shop", "shop")).is_none());
        assert!(index.upsert(entry("Orders", "orders")).is_none());
        let replaced = index.upsert(entry("shop", "shop")).unwrap();
        assert_eq!(replaced.name, "Shop");
        assert_eq!(index.entries().len(), 2);
        assert_eq!(index.entries()[0].name, "shop");
    }

    #[test]
    fn test_remove() {
        let mut index = DatabaseIndex::default();
        index.upsert(entry("Shop", "shop"));
        assert!(index.remove("missing").is_none());
        assert_eq!(index.remove("shop").unwrap().slug, "shop");
        assert!(index.entries().is_empty());
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let json = serde_json::to_value(entry("Shop", "shop")).unwrap();
        assert!(json.get("bundlePath").is_some());
        assert!(json.get("keyspaceName").is_some());
        assert!(json.get("createdAt").is_some());
    }

    #[tokio::test]
    async fn test_load_missing_and_roundtrip() {
        let path = scratch_index();
        assert!(DatabaseIndex::load(&path).await.unwrap().entries().is_empty());

        let mut index = DatabaseIndex::default();
        index.upsert(entry("Shop", "shop"));
        index.save(&path).await.unwrap();
        assert_eq!(DatabaseIndex::load(&path).await.unwrap(), index);

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[tokio::test]
    async fn test_saved_index_is_private_and_leaves_no_scratch() {
        let path = scratch_index();
        let mut index = DatabaseIndex::default();
        index.upsert(entry("Shop", "shop"));
        index.save(&path).await.unwrap();

        assert!(!path.with_extension("json.tmp").exists());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_index_is_an_error() {
        let path = scratch_index();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        let err = DatabaseIndex::load(&path).await.unwrap_err();
        assert!(matches!(err, ManagerError::Persistence(_)));

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }
}
