//! Configuration file loading and parsing.

use crate::errors::Error;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration loaded from TOML file. Absent keys leave the default.
///
/// Enum-valued keys are kept as strings and parsed during merge so a bad
/// value reports which setting is wrong.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub store_path: Option<PathBuf>,
    pub collection: Option<String>,
    pub embedder: Option<String>,
    pub embedding_model: Option<String>,
    pub model_cache: Option<PathBuf>,
    pub top_k: Option<usize>,
    pub source: Option<String>,
    pub distance_metric: Option<String>,
    pub duplicate_policy: Option<String>,
}

/// Location of the user config file: `<config_dir>/agent-kdb/config.toml`.
pub fn config_file_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let config_dir = dirs::config_dir().unwrap_or_else(|| home.join(".config"));

    config_dir.join("agent-kdb").join("config.toml")
}

/// Load configuration from the user's TOML file, if there is one.
pub fn load_from_file() -> Result<Option<ConfigFile>, Error> {
    let config_path = config_file_path();

    if config_path.exists() {
        load_from_path(&config_path).map(Some)
    } else {
        Ok(None)
    }
}

/// Read and parse a TOML config file.
pub fn load_from_path(config_path: &Path) -> Result<ConfigFile, Error> {
    let content = std::fs::read_to_string(config_path).map_err(|e| {
        Error::Config(format!(
            "Failed to read config file {}: {e}",
            config_path.display()
        ))
    })?;

    toml::from_str(&content).map_err(|e| {
        Error::Config(format!(
            "Failed to parse config file {}: {e}",
            config_path.display()
        ))
    })
}
