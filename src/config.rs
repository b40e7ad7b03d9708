//! Gate configuration
//!
//! Everything is fixed at process start. `GateConfig::from_env` reads:
//!   GATE_SHARED_SECRET     : HMAC key for access tokens (required)
//!   GATE_ORACLE_URL        : oracle generate endpoint (default: local Ollama)
//!   GATE_ORACLE_MODEL      : model name sent to the oracle (default: llama3)
//!   GATE_ORACLE_TIMEOUT_MS : oracle request timeout (default: 3000)
//!   GATE_WINDOW_SECS       : token window length (default: 30)
//!   GATE_VAULT_DIR         : vision vault root (default: ./sovereign_intellect)
//!   GATE_BIND_ADDR         : listen address (default: 127.0.0.1:1080)
//!   GATE_NODE_LABEL        : node label returned on authorization

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_ORACLE_URL: &str = "http://localhost:11434/api/generate";
pub const DEFAULT_ORACLE_MODEL: &str = "llama3";
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(30);
pub const DEFAULT_VAULT_DIR: &str = "./sovereign_intellect";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:1080";
pub const DEFAULT_NODE_LABEL: &str = "ABQM-SOVEREIGN-V100";

/// HMAC key shared with clients. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret(Vec<u8>);

impl SharedSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(***)")
    }
}

#[derive(Debug, Clone)]
pub struct GateConfig {
    pub shared_secret: SharedSecret,
    pub oracle_url: String,
    pub oracle_model: String,
    pub oracle_timeout: Duration,
    pub window: Duration,
    pub vault_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub node_label: String,
}

impl GateConfig {
    /// Defaults for everything except the secret.
    pub fn new(shared_secret: SharedSecret) -> Self {
        Self {
            shared_secret,
            oracle_url: DEFAULT_ORACLE_URL.to_string(),
            oracle_model: DEFAULT_ORACLE_MODEL.to_string(),
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
            window: DEFAULT_WINDOW,
            vault_dir: PathBuf::from(DEFAULT_VAULT_DIR),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 1080)),
            node_label: DEFAULT_NODE_LABEL.to_string(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` is this over the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret =
            lookup("GATE_SHARED_SECRET").ok_or(ConfigError::Missing("GATE_SHARED_SECRET"))?;
        let mut config = Self::new(SharedSecret::new(secret)?);

        if let Some(url) = lookup("GATE_ORACLE_URL") {
            reqwest::Url::parse(&url).map_err(|e| ConfigError::Invalid {
                var: "GATE_ORACLE_URL",
                value: url.clone(),
                reason: e.to_string(),
            })?;
            config.oracle_url = url;
        }
        if let Some(model) = lookup("GATE_ORACLE_MODEL") {
            config.oracle_model = model;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "GATE_ORACLE_TIMEOUT_MS")? {
            config.oracle_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "GATE_WINDOW_SECS")? {
            if secs == 0 {
                return Err(ConfigError::ZeroWindow);
            }
            config.window = Duration::from_secs(secs);
        }
        if let Some(dir) = lookup("GATE_VAULT_DIR") {
            config.vault_dir = PathBuf::from(dir);
        }
        if let Some(addr) = parse_var::<SocketAddr, _>(&lookup, "GATE_BIND_ADDR")? {
            config.bind_addr = addr;
        }
        if let Some(label) = lookup("GATE_NODE_LABEL") {
            config.node_label = label;
        }

        Ok(config)
    }

    pub fn with_oracle_url(mut self, url: impl Into<String>) -> Self {
        self.oracle_url = url.into();
        self
    }

    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    pub fn with_vault_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.vault_dir = dir.into();
        self
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                var,
                value,
                reason: e.to_string(),
            }),
    }
}
