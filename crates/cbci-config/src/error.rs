//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Core(#[from] cbci_core::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid JSON: expected an object, found {0}")]
    NotAnObject(String),

    #[error("Invalid key: {0}")]
    UnknownOption(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
