// src/config.rs

//! Configuration loading utilities.
//!
//! The CLI reads `config.toml` from its storage directory and overlays
//! notification secrets from the environment.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::Config;

/// File name of the configuration inside the storage directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Path of the configuration file under `storage_dir`.
pub fn config_path(storage_dir: &Path) -> PathBuf {
    storage_dir.join(CONFIG_FILE)
}

/// Load configuration from `storage_dir`.
///
/// A missing file falls back to defaults; a file that exists but does not
/// parse is an error. Environment overrides are applied in both cases.
pub fn load_config(storage_dir: &Path) -> Result<Config> {
    let path = config_path(storage_dir);
    let mut config = if path.exists() {
        let config = Config::load(&path)?;
        log::info!("Loaded configuration from {}", path.display());
        config
    } else {
        log::warn!("{} not found. Using default configuration.", path.display());
        Config::default()
    };

    config.apply_env();
    Ok(config)
}
