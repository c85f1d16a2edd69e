use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::errors::{StoreError, StoreResult};
use crate::log_store::{CorruptPolicy, DEFAULT_CAPACITY};

pub const DEFAULT_CONFIG_FILE: &str = "sink.toml";
pub const ENV_PREFIX: &str = "SINK_";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SinkConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub on_corrupt: CorruptPolicy,
    /// Only used to learn which local address faces the network.
    #[serde(default = "default_probe_addr")]
    pub probe_addr: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    12345
}

fn default_log_file() -> PathBuf {
    PathBuf::from("logs.json")
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_probe_addr() -> String {
    "8.8.8.8:80".to_string()
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig {
            host: default_host(),
            port: default_port(),
            log_file: default_log_file(),
            capacity: default_capacity(),
            log_level: default_log_level(),
            on_corrupt: CorruptPolicy::default(),
            probe_addr: default_probe_addr(),
        }
    }
}

impl SinkConfig {
    pub fn validate(&self) -> StoreResult<()> {
        if self.capacity == 0 {
            return Err(StoreError::config("capacity must be greater than zero"));
        }
        if self.port == 0 {
            return Err(StoreError::config("port must be a valid port (>0)"));
        }
        if self.log_file.as_os_str().is_empty() {
            return Err(StoreError::config("log_file cannot be empty"));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Defaults, then the TOML file (if present), then `SINK_*` variables.
pub fn figment_for(path: &Path) -> Figment {
    Figment::from(Serialized::defaults(SinkConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX))
}

/// Load and validate configuration. `path` falls back to
/// `SINK_CONFIG_PATH`, then to `sink.toml` in the working directory.
pub fn load_config(path: Option<&Path>) -> StoreResult<SinkConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => std::env::var_os("SINK_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
    };

    let config: SinkConfig = figment_for(&path)
        .extract()
        .map_err(|e| StoreError::config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}
