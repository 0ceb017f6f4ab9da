//! Configuration loading and management.

mod loader;
mod types;

pub use types::{Config, Defaults, SETTING_KEYS};
