use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use serde::{
    de::DeserializeOwned,
    Serialize,
};
use tracing::{
    debug,
    info,
};

use crate::core::{
    ConfigError,
    TranslationConfig,
    TranslatorError,
};

const APP_NAME: &str = "anki-ai-translator";
const CONFIG_FILE: &str = "config.json";

pub fn get_app_config_dir() -> PathBuf {
    match dirs::config_dir() {
        Some(config_dir) => config_dir.join(APP_NAME),
        None => PathBuf::from("."),
    }
}

pub fn default_config_path() -> PathBuf {
    get_app_config_dir().join(CONFIG_FILE)
}

pub fn save_json<T: Serialize>(data: &T, path: &Path) -> Result<(), TranslatorError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(data)?;
    fs::write(path, json)?;
    info!("Data saved to: {}", path.display());
    Ok(())
}

/// Loads `path`, or `T::default()` when the file does not exist yet.
pub fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, TranslatorError> {
    if !path.exists() {
        debug!("{} does not exist, using defaults", path.display());
        return Ok(T::default());
    }

    let json = fs::read_to_string(path)?;
    let data: T = serde_json::from_str(&json)?;
    debug!("Data loaded from: {}", path.display());
    Ok(data)
}

pub fn load_config(path: &Path) -> Result<TranslationConfig, ConfigError> {
    load_json(path).map_err(|e| ConfigError::Unreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub fn save_config(config: &TranslationConfig, path: &Path) -> Result<(), TranslatorError> {
    save_json(config, path)
}

pub fn delete_data_file(path: &Path) -> Result<bool, TranslatorError> {
    if path.exists() {
        fs::remove_file(path)?;
        info!("Deleted: {}", path.display());
        return Ok(true);
    }
    Ok(false)
}
