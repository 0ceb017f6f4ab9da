//! Config command handlers.

use crate::cli::ConfigCommands;
use crate::config::Config;
use crate::error::{ManagerError, Result};
use crate::store::keychain_available;

/// Handle `astradb config ...`. `config` is the loaded file with CLI
/// overrides already applied.
pub fn handle_config(config: &Config, command: &ConfigCommands) -> Result<bool> {
    match command {
        ConfigCommands::Generate { path, overwrite } => {
            let config_path = Config::generate_config_file(path.clone(), *overwrite)?;
            println!("Config file generated at: {}", config_path.display());
        }
        ConfigCommands::List => {
            match Config::find_existing_config() {
                Some(path) => println!("Config file: {}", path.display()),
                None => println!("Config file: (none, using defaults)"),
            }
            println!();
            println!("Current Configuration:");
            println!("  data_dir: {}", config.data_dir().display());
            println!("  probe_timeout_ms: {}", config.probe_timeout().as_millis());
            println!("  keyring_service: {}", config.keyring_service());
            println!("  verify_on_save: {}", config.verify_on_save());
            println!();
            let keychain = if keychain_available(&config.keyring_service()) {
                "available"
            } else {
                "unavailable"
            };
            println!("OS keychain: {}", keychain);
        }
        ConfigCommands::Get { key } => {
            println!("{}", config.get_default(key)?);
        }
        ConfigCommands::Set { key, value } => {
            let config_path = Config::find_existing_config().ok_or_else(|| {
                ManagerError::config("Config file not found. Run 'astradb config generate' first.")
            })?;
            let mut file_config = Config::load_from_path(&config_path)?;
            file_config.set_default(key, value)?;
            file_config.save(&config_path)?;
            println!("Updated {} = {}", key, value);
        }
    }
    Ok(true)
}
