//! Local state: the database index and the secret store.

mod index;
mod keychain;

pub use index::{
    BUNDLE_FILE, DATABASES_DIR, DatabaseEntry, DatabaseIndex, INDEX_FILE, StorageLayout,
};
pub use keychain::{DEFAULT_SERVICE, KeyringStore, MemoryStore, SecretStore, keychain_available};
