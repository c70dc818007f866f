//! Configuration management

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Connection key used when callers don't name one
pub const DEFAULT_CONNECTION_KEY: &str = "default";

/// A single option value handed to the SDK constructor
pub type OptionValue = serde_json::Value;

/// Constructor options, passed through to the SDK untouched
pub type ConnectionOptions = serde_json::Map<String, OptionValue>;

/// All configured connections, keyed by connection key
pub type ConnectionSet = HashMap<String, ConnectionConfig>;

/// A named connection profile
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ConnectionConfig {
    /// The value passed to the SDK client constructor
    #[serde(default)]
    pub options: ConnectionOptions,
}

impl ConnectionConfig {
    pub fn new(options: ConnectionOptions) -> Self {
        Self { options }
    }
}

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    /// Directory holding the SDK library. Not needed when the host
    /// supplies an already loaded client factory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_lib_path: Option<PathBuf>,
    /// Connection profiles (default: one "default" entry with empty credentials)
    #[serde(default = "default_connections")]
    pub connections: ConnectionSet,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            sdk_lib_path: None,
            connections: default_connections(),
        }
    }
}

impl RegistryConfig {
    /// Parse a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(ConfigError::Parse)
    }

    /// Read and parse a JSON configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }
}

fn default_connections() -> ConnectionSet {
    let options = ConnectionOptions::from_iter([
        ("appId".to_string(), OptionValue::from("")),
        ("secret".to_string(), OptionValue::from("")),
    ]);

    HashMap::from([(
        DEFAULT_CONNECTION_KEY.to_string(),
        ConnectionConfig::new(options),
    )])
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[source] serde_json::Error),
}
