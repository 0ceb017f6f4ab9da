//! Configuration type definitions.

use knuffel::Decode;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ManagerError;
use crate::probe::DEFAULT_PROBE_TIMEOUT;
use crate::store::DEFAULT_SERVICE;

/// Settings accepted by `config get` / `config set`.
pub const SETTING_KEYS: [&str; 4] = [
    "data_dir",
    "probe_timeout_ms",
    "keyring_service",
    "verify_on_save",
];

/// Expand tilde (~) prefix to the user's home directory.
/// Handles both "~" alone and "~/path/to/something" patterns.
pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

/// Main configuration structure parsed from astradb.kdl.
#[derive(Debug, Decode, Clone, Default)]
pub struct Config {
    #[knuffel(child)]
    pub defaults: Option<Defaults>,
}

/// Default settings for astradb.
#[derive(Debug, Decode, Clone, Default)]
pub struct Defaults {
    /// Managed storage root.
    #[knuffel(property(name = "data_dir"))]
    pub data_dir: Option<String>,

    #[knuffel(property(name = "probe_timeout_ms"))]
    pub probe_timeout_ms: Option<u64>,

    /// Secret store namespace.
    #[knuffel(property(name = "keyring_service"))]
    pub keyring_service: Option<String>,

    /// Run the live probe during save when a token is present.
    #[knuffel(property(name = "verify_on_save"))]
    pub verify_on_save: Option<bool>,
}

fn unknown_setting(key: &str) -> ManagerError {
    ManagerError::config(format!(
        "Unknown setting: {}. Valid settings: {}",
        key,
        SETTING_KEYS.join(", ")
    ))
}

fn check_probe_timeout(ms: u64) -> crate::error::Result<()> {
    if ms == 0 {
        return Err(ManagerError::config(
            "probe_timeout_ms must be greater than zero",
        ));
    }
    Ok(())
}

impl Config {
    /// Reject settings that parse but cannot work.
    pub fn validate(&self) -> crate::error::Result<()> {
        if let Some(ms) = self.defaults.as_ref().and_then(|d| d.probe_timeout_ms) {
            check_probe_timeout(ms)?;
        }
        Ok(())
    }

    /// Get the managed storage root, defaulting to the platform data
    /// directory, else "./.astradb". Expands ~ if present.
    pub fn data_dir(&self) -> PathBuf {
        self.defaults
            .as_ref()
            .and_then(|d| d.data_dir.as_deref())
            .map(expand_tilde)
            .or_else(|| dirs::data_dir().map(|d| d.join("astradb-manager")))
            .unwrap_or_else(|| PathBuf::from("./.astradb"))
    }

    /// Get the probe timeout, defaulting to 8000 ms
    pub fn probe_timeout(&self) -> Duration {
        self.defaults
            .as_ref()
            .and_then(|d| d.probe_timeout_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_PROBE_TIMEOUT)
    }

    /// Get the keychain service name
    pub fn keyring_service(&self) -> String {
        self.defaults
            .as_ref()
            .and_then(|d| d.keyring_service.clone())
            .unwrap_or_else(|| DEFAULT_SERVICE.to_string())
    }

    pub fn verify_on_save(&self) -> bool {
        self.defaults
            .as_ref()
            .and_then(|d| d.verify_on_save)
            .unwrap_or(true)
    }

    /// Update a default setting
    pub fn set_default(&mut self, key: &str, value: &str) -> crate::error::Result<()> {
        let defaults = self.defaults.get_or_insert(Defaults::default());
        match key {
            "data_dir" => defaults.data_dir = Some(value.to_string()),
            "probe_timeout_ms" => {
                let ms = value.parse().map_err(|_| {
                    ManagerError::config("Invalid number for probe_timeout_ms")
                })?;
                check_probe_timeout(ms)?;
                defaults.probe_timeout_ms = Some(ms)
            }
            "keyring_service" => defaults.keyring_service = Some(value.to_string()),
            "verify_on_save" => {
                defaults.verify_on_save = Some(value.parse().map_err(|_| {
                    ManagerError::config("verify_on_save must be true or false")
                })?)
            }
            _ => return Err(unknown_setting(key)),
        }
        Ok(())
    }

    /// Get a default setting value as string
    pub fn get_default(&self, key: &str) -> crate::error::Result<String> {
        match key {
            "data_dir" => Ok(self.data_dir().to_string_lossy().to_string()),
            "probe_timeout_ms" => Ok(self.probe_timeout().as_millis().to_string()),
            "keyring_service" => Ok(self.keyring_service()),
            "verify_on_save" => Ok(self.verify_on_save().to_string()),
            _ => Err(unknown_setting(key)),
        }
    }
}
