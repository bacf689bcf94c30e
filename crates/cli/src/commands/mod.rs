//! Command implementations.

pub mod export;
pub mod seed;
pub mod stores;

use std::sync::Arc;

use sav_admin::config::{AdminConfig, ConfigError};
use sav_admin::state::AppState;
use sav_admin::store::{MemoryStore, StoreError};
use sav_core::{AuthError, DirectoryError, MagasinCodeError, StoreDirectory, ValidationError};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Store table in `SAV_STORE_PINS` is invalid.
    #[error("Store table error: {0}")]
    Directory(#[from] DirectoryError),

    /// Document store operation failed.
    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    /// PIN check refused.
    #[error("PIN refused: {0}")]
    Auth(#[from] AuthError),

    /// Invalid store code argument.
    #[error("Invalid store code: {0}")]
    StoreCode(#[from] MagasinCodeError),

    /// A fixture record is invalid.
    #[error("Invalid {kind} #{index}: {source}")]
    Invalid {
        kind: &'static str,
        index: usize,
        source: ValidationError,
    },

    /// Unknown collection name.
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    /// File could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fixture is not valid YAML for the expected shape.
    #[error("Fixture error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Export could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Store table from `SAV_STORE_PINS`, or the built-in one.
pub(crate) fn directory_from_env() -> Result<StoreDirectory, CliError> {
    match std::env::var("SAV_STORE_PINS") {
        Ok(spec) if !spec.trim().is_empty() => Ok(StoreDirectory::parse(&spec)?),
        _ => Ok(StoreDirectory::builtin()),
    }
}

/// State over the configured document store, or an empty in-memory one.
pub(crate) fn open_state(in_memory: bool) -> Result<AppState, CliError> {
    if in_memory {
        let config = AdminConfig::local("http://127.0.0.1:3001");
        return Ok(AppState::with_store(config, Arc::new(MemoryStore::new())));
    }
    let config = AdminConfig::from_env()?;
    Ok(AppState::new(config)?)
}
