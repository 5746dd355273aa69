use std::path::PathBuf;

use thiserror::Error;

use crate::anki::NoteStoreError;

#[derive(Error, Debug)]
pub enum TranslatorError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(Box<reqwest::Error>),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    NoteStore(#[from] NoteStoreError),

    #[error("No card is currently shown in the reviewer")]
    NoCurrentNote,
}

/// Fatal problems detected before any note is touched.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{env_var}' is not set (credential for {provider})")]
    MissingCredential { provider: &'static str, env_var: String },

    #[error("Invalid field mapping: {0}")]
    InvalidFieldMapping(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Unknown config key '{0}'")]
    UnknownKey(String),

    #[error("Failed to read config {path:?}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
}

impl From<std::io::Error> for TranslatorError {
    fn from(error: std::io::Error) -> Self {
        TranslatorError::Io(Box::new(error))
    }
}

impl From<reqwest::Error> for TranslatorError {
    fn from(error: reqwest::Error) -> Self {
        TranslatorError::Reqwest(Box::new(error))
    }
}
