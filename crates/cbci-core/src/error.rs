//! Error types for cbci.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("Environment variable {0} not set.")]
    MissingEnv(String),

    #[error("Invalid SDK project: {0}")]
    InvalidProject(String),

    #[error("Expected at least {expected} tokens, found {found}.")]
    WheelNameTooShort { expected: usize, found: usize },

    #[error("Expected at project name to be {expected}, found {found}.")]
    WheelProjectMismatch { expected: String, found: String },
}

pub type Result<T> = std::result::Result<T, Error>;
