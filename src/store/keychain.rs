//! Secret storage for credentials documents.
//!
//! Credentials never touch the managed directory. They live in the OS
//! native credential store (macOS Keychain, Linux keyutils / Secret Service,
//! Windows Credential Manager) under a fixed service name, keyed by the
//! database's display name.
//!
//! Entry layout: service = `{keyring_service}`, user = `{display name}`,
//! password = raw credentials JSON.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{ManagerError, Result};

/// Default service name for keychain entries.
pub const DEFAULT_SERVICE: &str = "astra-db-manager";

/// Key/value secret storage keyed by display name.
///
/// Implementations are blocking; async callers run them on the blocking
/// pool.
pub trait SecretStore: Send + Sync {
    /// Fetch the secret stored under `name`; `Ok(None)` when there is none.
    fn get(&self, name: &str) -> Result<Option<String>>;

    /// Store `value` under `name`, overwriting any previous value.
    fn set(&self, name: &str, value: &str) -> Result<()>;

    /// Remove the secret under `name`. Removing a missing entry succeeds.
    fn delete(&self, name: &str) -> Result<()>;
}

/// [`SecretStore`] backed by the OS keychain through the `keyring` crate.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE)
    }
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, name: &str) -> Result<keyring::Entry> {
        Ok(keyring::Entry::new(&self.service, name)?)
    }
}

impl SecretStore for KeyringStore {
    fn get(&self, name: &str) -> Result<Option<String>> {
        match self.entry(name)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        self.entry(name)?.set_password(value)?;
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        match self.entry(name)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Check whether the OS keychain backend is functional.
///
/// Performs a real round-trip probe: writes a test value, reads it back, and
/// deletes it. Returns `false` if any step fails, which catches cases where
/// the `keyring` crate falls back to a non-functional mock store (e.g. when
/// no platform-native backend is available).
pub fn keychain_available(service: &str) -> bool {
    let entry = match keyring::Entry::new(service, "__astradb_probe__") {
        Ok(e) => e,
        Err(_) => return false,
    };

    let probe_value = "__astradb_probe_value__";

    if entry.set_password(probe_value).is_err() {
        return false;
    }

    let ok = entry
        .get_password()
        .map(|v| v == probe_value)
        .unwrap_or(false);

    // Always clean up the probe entry
    let _ = entry.delete_credential();

    ok
}

/// In-process [`SecretStore`], for tests and machines without a keychain.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored secrets.
    pub fn len(&self) -> usize {
        self.values.lock().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| ManagerError::Keychain("memory store poisoned".to_string()))
    }
}

impl SecretStore for MemoryStore {
    fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(name).cloned())
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        self.lock()?.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.lock()?.remove(name);
        Ok(())
    }
}
