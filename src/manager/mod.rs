//! The manager boundary.
//!
//! [`DatabaseManager`] strings the validators, the prober, the naming rules
//! and the schema introspector together over one managed storage root.
//! Every public operation returns a [`Reply`]; internal failures become
//! `{ success: false, message }` and never escape as errors.

mod reply;

pub use reply::{BundleConfigData, CreateCqlData, DatabasesData, Empty, EntriesData, Reply, SaveData};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::archive::{BundleSource, list_entries};
use crate::bundle::{read_bundle_config, validate_bundle};
use crate::config::Config;
use crate::credentials::{CredentialsDocument, validate_credentials};
use crate::driver::{Connector, CqlSession, KeyspaceMetadata, default_connector};
use crate::error::{ManagerError, Result};
use crate::naming::{derive_keyspace, derive_name, slugify};
use crate::probe::{DEFAULT_PROBE_TIMEOUT, require_connection};
use crate::schema::{
    SchemaSummary, find_table, find_type, load_keyspace, render_create_table, render_create_type,
    resolve_keyspace, summarize,
};
use crate::store::{DatabaseEntry, DatabaseIndex, KeyringStore, SecretStore, StorageLayout};
use crate::utils::copy_private;

/// Message of a successful `test_connection` that did not go live.
pub const STRUCTURAL_ONLY_MESSAGE: &str =
    "Bundle and credentials are structurally valid (no token present, live connection not attempted)";

/// Message of a successful live `test_connection`.
pub const CONNECTED_MESSAGE: &str = "Connection succeeded";

/// Saved-database manager over one storage root.
pub struct DatabaseManager {
    layout: StorageLayout,
    secrets: Arc<dyn SecretStore>,
    connector: Arc<dyn Connector>,
    probe_timeout: Duration,
    verify_on_save: bool,
}

impl DatabaseManager {
    pub fn new(
        root: impl Into<PathBuf>,
        secrets: Arc<dyn SecretStore>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            layout: StorageLayout::new(root),
            secrets,
            connector,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            verify_on_save: true,
        }
    }

    /// Manager backed by the OS keychain and the CQL driver, configured from
    /// `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.data_dir(),
            Arc::new(KeyringStore::new(config.keyring_service())),
            default_connector(),
        )
        .with_probe_timeout(config.probe_timeout())
        .with_verify_on_save(config.verify_on_save())
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_verify_on_save(mut self, verify: bool) -> Self {
        self.verify_on_save = verify;
        self
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    // ── Boundary operations ────────────────────────────────────────────

    /// Validate and store a bundle plus credentials as a named database.
    ///
    /// With a token present (and `verify_on_save` on) the live probe must
    /// pass before anything is written.
    pub async fn save_database(
        &self,
        name: Option<&str>,
        bundle_path: &Path,
        credentials_path: &Path,
    ) -> Reply<SaveData> {
        let result = self.try_save(name, bundle_path, credentials_path).await;
        finish("save", result.map(|db| SaveData { db }))
    }

    /// Structural checks, then a live probe when the credentials carry a token.
    pub async fn test_connection(&self, bundle_path: &Path, credentials_path: &Path) -> Reply<Empty> {
        match self.try_test(bundle_path, credentials_path).await {
            Ok(message) => Reply::ok_with_message(Empty {}, message),
            Err(e) => finish("test", Err(e)),
        }
    }

    pub async fn list_bundle_entries(&self, source: impl Into<BundleSource>) -> Reply<EntriesData> {
        let source = source.into();
        let result = list_entries(&source).await.map(|set| EntriesData {
            entries: set.into_iter().collect(),
        });
        finish("entries", result)
    }

    pub async fn get_bundle_config(&self, source: impl Into<BundleSource>) -> Reply<BundleConfigData> {
        let source = source.into();
        let result = match read_bundle_config(&source).await {
            Ok(Some(config)) => Ok(BundleConfigData { config }),
            Ok(None) => Err(ManagerError::not_found("config.json not found")),
            Err(e) => Err(e),
        };
        finish("bundle-config", result)
    }

    pub async fn list_databases(&self) -> Reply<DatabasesData> {
        let result = DatabaseIndex::load(&self.layout.index_path())
            .await
            .map(|index| DatabasesData {
                databases: index.into_entries(),
            });
        finish("list", result)
    }

    /// Remove a saved database. Unknown slugs succeed without side effects.
    pub async fn delete_database(&self, slug: &str) -> Reply<Empty> {
        finish("delete", self.try_delete(slug).await.map(|()| Empty {}))
    }

    pub async fn get_schema(&self, slug: &str) -> Reply<SchemaSummary> {
        let result = self.introspect(slug).await.map(|ks| summarize(&ks));
        finish("schema", result)
    }

    pub async fn describe_table(&self, slug: &str, table_name: &str) -> Reply<CreateCqlData> {
        let result = self.introspect(slug).await.and_then(|ks| {
            let table = find_table(&ks, table_name)?;
            Ok(CreateCqlData {
                create_cql: render_create_table(&ks.name, table),
            })
        });
        finish("describe-table", result)
    }

    pub async fn describe_type(&self, slug: &str, type_name: &str) -> Reply<CreateCqlData> {
        let result = self.introspect(slug).await.and_then(|ks| {
            let udt = find_type(&ks, type_name)?;
            Ok(CreateCqlData {
                create_cql: render_create_type(&ks.name, udt),
            })
        });
        finish("describe-type", result)
    }

    // ── Internals ──────────────────────────────────────────────────────

    async fn try_save(
        &self,
        name: Option<&str>,
        bundle_path: &Path,
        credentials_path: &Path,
    ) -> Result<DatabaseEntry> {
        validate_bundle(bundle_path).await?;
        let credentials = validate_credentials(credentials_path).await?;

        if self.verify_on_save
            && let Some(token) = credentials.token()
        {
            require_connection(self.connector.as_ref(), bundle_path, token, self.probe_timeout)
                .await?;
        }

        let name = derive_name(bundle_path, name).await;
        let slug = slugify(&name);
        let keyspace_name = derive_keyspace(bundle_path).await;

        let index_path = self.layout.index_path();
        let mut index = DatabaseIndex::load(&index_path).await?;

        let entry_dir = self.layout.entry_dir(&slug);
        let fresh_dir = !tokio::fs::try_exists(&entry_dir).await.unwrap_or(false);
        let dest = self.layout.bundle_path(&slug);
        let staged = dest.with_extension("zip.staged");

        let entry = DatabaseEntry {
            name,
            slug,
            bundle_path: dest,
            keyspace_name,
            created_at: Utc::now(),
        };

        let result = match copy_private(bundle_path, &staged).await {
            Ok(()) => {
                self.commit_save(&mut index, &index_path, &entry, &staged, credentials.raw())
                    .await
            }
            Err(e) => Err(e),
        };

        let replaced = match result {
            Ok(replaced) => replaced,
            Err(e) => {
                remove_quietly(&staged).await;
                if fresh_dir && let Err(err) = tokio::fs::remove_dir_all(&entry_dir).await {
                    tracing::warn!(path = %entry_dir.display(), error = %err, "failed to remove entry directory");
                }
                return Err(e);
            }
        };

        if let Some(old) = replaced
            && old.name != entry.name
            && let Err(e) = self.secret_delete(&old.name).await
        {
            tracing::warn!(name = %old.name, error = %e, "failed to remove replaced secret");
        }

        tracing::info!(name = %entry.name, slug = %entry.slug, "database saved");
        Ok(entry)
    }

    /// Store the secret, move the staged bundle into place and write the
    /// index. Any failure restores the previous bundle and secret.
    async fn commit_save(
        &self,
        index: &mut DatabaseIndex,
        index_path: &Path,
        entry: &DatabaseEntry,
        staged: &Path,
        secret: &str,
    ) -> Result<Option<DatabaseEntry>> {
        let previous_secret = self.secret_get(&entry.name).await?;
        self.secret_set(&entry.name, secret).await?;

        let dest = &entry.bundle_path;
        let backup = dest.with_extension("zip.bak");
        let persist_err = |e: std::io::Error| {
            ManagerError::persistence(format!("Cannot install {}: {}", dest.display(), e))
        };

        let replaced = index.upsert(entry.clone());
        let mut backed_up = false;
        let mut installed = false;
        let committed: Result<()> = async {
            if tokio::fs::try_exists(dest).await.unwrap_or(false) {
                tokio::fs::rename(dest, &backup).await.map_err(persist_err)?;
                backed_up = true;
            }
            tokio::fs::rename(staged, dest).await.map_err(persist_err)?;
            installed = true;
            index.save(index_path).await
        }
        .await;

        if let Err(e) = committed {
            if installed {
                remove_quietly(dest).await;
            }
            if backed_up && let Err(err) = tokio::fs::rename(&backup, dest).await {
                tracing::warn!(path = %dest.display(), error = %err, "failed to restore previous bundle");
            }
            let restored = match previous_secret {
                Some(value) => self.secret_set(&entry.name, &value).await,
                None => self.secret_delete(&entry.name).await,
            };
            if let Err(err) = restored {
                tracing::warn!(name = %entry.name, error = %err, "failed to restore previous secret");
            }
            return Err(e);
        }

        if backed_up {
            remove_quietly(&backup).await;
        }
        Ok(replaced)
    }

    async fn try_test(&self, bundle_path: &Path, credentials_path: &Path) -> Result<String> {
        validate_bundle(bundle_path).await?;
        let credentials = validate_credentials(credentials_path).await?;

        let Some(token) = credentials.token() else {
            return Ok(STRUCTURAL_ONLY_MESSAGE.to_string());
        };
        require_connection(self.connector.as_ref(), bundle_path, token, self.probe_timeout).await?;
        Ok(CONNECTED_MESSAGE.to_string())
    }

    async fn try_delete(&self, slug: &str) -> Result<()> {
        let index_path = self.layout.index_path();
        let mut index = DatabaseIndex::load(&index_path).await?;
        let Some(entry) = index.remove(slug) else {
            tracing::debug!(slug, "delete: no such database");
            return Ok(());
        };

        if let Err(e) = self.secret_delete(&entry.name).await {
            tracing::warn!(name = %entry.name, error = %e, "failed to remove secret");
        }
        match tokio::fs::remove_dir_all(self.layout.entry_dir(&entry.slug)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(slug, error = %e, "failed to remove database directory"),
        }

        index.save(&index_path).await?;
        tracing::info!(name = %entry.name, slug, "database deleted");
        Ok(())
    }

    /// Open a session for `slug`, fetch its keyspace metadata, and close the
    /// session again on every path.
    async fn introspect(&self, slug: &str) -> Result<KeyspaceMetadata> {
        let index = DatabaseIndex::load(&self.layout.index_path()).await?;
        let entry = index
            .find(slug)
            .ok_or_else(|| ManagerError::not_found(format!("Database not found: {}", slug)))?;

        let raw = self.secret_get(&entry.name).await?.ok_or_else(|| {
            ManagerError::not_found(format!("No credentials stored for '{}'", entry.name))
        })?;
        let credentials = CredentialsDocument::parse(&raw)?;
        let token = credentials.token().ok_or_else(|| {
            ManagerError::validation(format!(
                "Stored credentials for '{}' have no token",
                entry.name
            ))
        })?;

        let session = self
            .connector
            .connect(&entry.bundle_path, token)
            .await
            .map_err(|e| e.redacted(token))?;
        let result = keyspace_for(entry, session.as_ref())
            .await
            .map_err(|e| e.redacted(token));
        session.shutdown().await;
        result
    }

    async fn secret_get(&self, name: &str) -> Result<Option<String>> {
        let store = Arc::clone(&self.secrets);
        let name = name.to_string();
        tokio::task::spawn_blocking(move || store.get(&name)).await?
    }

    async fn secret_set(&self, name: &str, value: &str) -> Result<()> {
        let store = Arc::clone(&self.secrets);
        let name = name.to_string();
        let value = value.to_string();
        tokio::task::spawn_blocking(move || store.set(&name, &value)).await?
    }

    async fn secret_delete(&self, name: &str) -> Result<()> {
        let store = Arc::clone(&self.secrets);
        let name = name.to_string();
        tokio::task::spawn_blocking(move || store.delete(&name)).await?
    }
}

/// Best-effort removal of a scratch file.
async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove file");
    }
}

async fn keyspace_for(entry: &DatabaseEntry, session: &dyn CqlSession) -> Result<KeyspaceMetadata> {
    let keyspace = resolve_keyspace(&entry.keyspace_name, session, &entry.bundle_path)
        .await
        .ok_or_else(|| {
            ManagerError::not_found(format!(
                "No keyspace could be resolved for database '{}'",
                entry.name
            ))
        })?;
    load_keyspace(session, &keyspace).await
}

fn finish<T>(operation: &str, result: Result<T>) -> Reply<T> {
    if let Err(e) = &result {
        tracing::warn!(operation, error = %e, "operation failed");
    }
    result.into()
}
