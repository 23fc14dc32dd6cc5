//! Error types for the CLI/TOML config layer and the Config Store's
//! file-based persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for loading and validating the CLI+TOML configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the TOML configuration file.
    #[error("failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Failed to parse the TOML configuration.
    #[error("failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// Failed to write a configuration template (`init`).
    #[error("failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Invalid webhook URL supplied via CLI or TOML.
    #[error("invalid webhook url '{url}': {reason}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
        /// Reason for invalidity.
        reason: String,
    },
    /// Invalid default interval (zero, or below the 5s floor).
    #[error("invalid interval: {reason}")]
    InvalidInterval {
        /// Reason for invalidity.
        reason: String,
    },
    /// Invalid failure threshold (must be >= 1).
    #[error("invalid failure threshold: {reason}")]
    InvalidFailureThreshold {
        /// Reason for invalidity.
        reason: String,
    },
}

/// Errors from the Config Store's file-based implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to read the store file.
    #[error("failed to read store file '{}': {source}", path.display())]
    Read {
        /// Path to the store file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Failed to write the store file.
    #[error("failed to write store file '{}': {source}", path.display())]
    Write {
        /// Path to the store file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Failed to serialize the store document to JSON.
    #[error("failed to serialize store document: {0}")]
    Serialize(#[source] serde_json::Error),
    /// Failed to parse the on-disk store document.
    #[error("failed to parse store document: {0}")]
    Parse(#[source] serde_json::Error),
}

impl From<StoreError> for crate::error::EngineError {
    fn from(err: StoreError) -> Self {
        Self::PersistenceError(err.to_string())
    }
}
