//! Error types for the access gate
//!
//! Only infrastructure faults are errors here. Authentication failure, duress
//! and ethical rejection are ordinary [`crate::gate::GateDecision`] branches.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the gate
#[derive(Error, Debug)]
pub enum GateError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("Oracle client could not be built: {0}")]
    OracleClient(#[from] reqwest::Error),
}

/// Startup configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("Invalid value '{value}' for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Shared secret must not be empty")]
    EmptySecret,

    #[error("Time window must be at least one second")]
    ZeroWindow,
}

/// Vision vault storage errors
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("I/O error during {op} on {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Purge could not complete: {0}")]
    PurgeIncomplete(String),

    #[error("Invalid vision id '{0}'")]
    InvalidVisionId(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VaultError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VaultError::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

pub type GateResult<T> = Result<T, GateError>;
pub type VaultResult<T> = Result<T, VaultError>;
