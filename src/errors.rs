// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Classified run outcomes (timeout, interrupt, missing tool) are *values*
//! carried by [`crate::types::Outcome`]; the errors here are the failures
//! that sit outside that contract.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KimiRunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Working directory {path:?} unusable: {source}")]
    Workdir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

pub type Result<T> = std::result::Result<T, KimiRunError>;
