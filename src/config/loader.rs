//! Configuration file loading and saving.

use std::path::{Path, PathBuf};

use super::types::Config;
use crate::error::{ManagerError, Result};

const CONFIG_FILE: &str = "astradb.kdl";

impl Config {
    /// Get the explicit ~/.config/astradb/astradb.kdl path (XDG-style, cross-platform)
    fn xdg_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".config/astradb").join(CONFIG_FILE))
    }

    /// Get the list of config file search paths in priority order
    fn get_config_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. ./astradb.kdl (current directory)
        paths.push(PathBuf::from(CONFIG_FILE));

        // 2. ~/.config/astradb/astradb.kdl
        if let Some(xdg_path) = Self::xdg_config_path() {
            paths.push(xdg_path);
        }

        // 3. Platform-native config directory, unless identical to the XDG path
        if let Some(config_dir) = dirs::config_dir() {
            let native_path = config_dir.join("astradb").join(CONFIG_FILE);
            if Self::xdg_config_path().as_ref() != Some(&native_path) {
                paths.push(native_path);
            }
        }

        // 4. XDG data directory
        if let Some(data_dir) = dirs::data_dir() {
            paths.push(data_dir.join("astradb").join(CONFIG_FILE));
        }

        // 5. ~/astradb/astradb.kdl
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join("astradb").join(CONFIG_FILE));
        }

        paths
    }

    /// Find existing config file by searching all standard locations
    pub fn find_existing_config() -> Option<PathBuf> {
        Self::get_config_search_paths()
            .into_iter()
            .find(|path| path.exists())
    }

    /// Get the default config path (~/.config/astradb/astradb.kdl)
    pub fn default_config_path() -> PathBuf {
        Self::xdg_config_path().unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ManagerError::config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config = knuffel::parse::<Config>(CONFIG_FILE, &content)
            .map_err(|e| ManagerError::config(format!("{}: {}", path.display(), e)))?;
        config
            .validate()
            .map_err(|e| ManagerError::config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Load configuration from astradb.kdl, searching multiple locations.
    /// No file means built-in defaults.
    pub fn load() -> Result<Self> {
        match Self::find_existing_config() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::load_from_path(&path)
            }
            None => Ok(Config::default()),
        }
    }

    /// Generate a config file with default values
    pub fn generate_config_file(path: Option<PathBuf>, overwrite: bool) -> Result<PathBuf> {
        let config_path = path.unwrap_or_else(Self::default_config_path);

        if config_path.exists() && !overwrite {
            return Err(ManagerError::config(format!(
                "Config file already exists at: {}. Use --overwrite to replace it.",
                config_path.display()
            )));
        }

        if let Some(parent) = config_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        let kdl_content = r#"// Global defaults
// probe_timeout_ms bounds the live connection check (default: 8000)
// verify_on_save runs that check during save when the credentials carry a token
defaults probe_timeout_ms=8000 keyring_service="astra-db-manager" verify_on_save=true
// data_dir="~/.local/share/astradb-manager"
"#;

        std::fs::write(&config_path, kdl_content)?;
        Ok(config_path)
    }

    /// Serialize config to KDL format
    pub fn to_kdl(&self) -> String {
        let mut output = String::new();

        output.push_str("// astradb configuration file\n");
        output.push_str("// probe_timeout_ms is in milliseconds (default: 8000)\n\n");

        output.push_str("defaults");
        if let Some(d) = &self.defaults {
            if let Some(data_dir) = &d.data_dir {
                output.push_str(&format!(" data_dir={:?}", data_dir));
            }
            if let Some(ms) = d.probe_timeout_ms {
                output.push_str(&format!(" probe_timeout_ms={}", ms));
            }
            if let Some(service) = &d.keyring_service {
                output.push_str(&format!(" keyring_service={:?}", service));
            }
            if let Some(verify) = d.verify_on_save {
                output.push_str(&format!(" verify_on_save={}", verify));
            }
        }
        output.push('\n');

        output
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_kdl())?;
        Ok(())
    }
}
