use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Per-node pinner configuration, persisted as TOML.
///
/// Two nodes that share an eviction policy must agree on `grace_period`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PinnerConfig {
    #[serde(default = "default_storage_node_address")]
    pub storage_node_address: String,
    #[serde(default = "default_storage_node_port")]
    pub storage_node_port: u16,
    pub ledger_path: PathBuf,
    /// Grace period in seconds.
    #[serde(default = "default_grace_period")]
    pub grace_period: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    pub registry: RegistryConfig,
}

impl PinnerConfig {
    /// Loads config from a TOML file. Unlike UI settings there is no usable
    /// default, so a missing file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Validates config values and returns list of validation errors.
    /// Returns empty vec if config is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.storage_node_address.trim().is_empty() {
            errors.push("storage_node_address must not be empty".to_string());
        }

        if self.storage_node_port == 0 {
            errors.push("storage_node_port must not be 0".to_string());
        }

        if self.ledger_path.as_os_str().is_empty() {
            errors.push("ledger_path must not be empty".to_string());
        }

        if self.grace_period == 0 {
            errors.push("grace_period must be at least 1 second".to_string());
        }

        if self.request_timeout_secs == 0 {
            errors.push("request_timeout_secs must be at least 1".to_string());
        }

        if self.log_level.parse::<tracing::Level>().is_err() {
            errors.push(format!("log_level '{}' is not a valid level", self.log_level));
        }

        errors.extend(self.registry.validate());
        errors
    }

    /// Base URL of the storage node's control API. A scheme already present in
    /// `storage_node_address` is kept.
    pub fn storage_node_url(&self) -> String {
        let address = self.storage_node_address.trim().trim_end_matches('/');
        if address.starts_with("http://") || address.starts_with("https://") {
            format!("{}:{}", address, self.storage_node_port)
        } else {
            format!("http://{}:{}", address, self.storage_node_port)
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Where listing events come from and how a listing's content hash is read.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_provider_url")]
    pub provider_url: String,
    pub registry_address: String,
    #[serde(default = "default_event_signature")]
    pub event_signature: String,
    #[serde(default = "default_listing_address_method")]
    pub listing_address_method: String,
    #[serde(default = "default_listing_hash_method")]
    pub listing_hash_method: String,
    /// When set, listing events are fetched from an Etherscan-compatible API
    /// instead of `eth_getLogs`. Contract calls still go to `provider_url`.
    #[serde(default)]
    pub etherscan: Option<EtherscanConfig>,
}

impl RegistryConfig {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.provider_url.trim().is_empty() {
            errors.push("registry.provider_url must not be empty".to_string());
        }

        let address = self.registry_address.trim_start_matches("0x");
        if address.len() != 40 || hex::decode(address).is_err() {
            errors.push(format!(
                "registry.registry_address '{}' is not a 20-byte hex address",
                self.registry_address
            ));
        }

        for (name, signature) in [
            ("event_signature", &self.event_signature),
            ("listing_address_method", &self.listing_address_method),
            ("listing_hash_method", &self.listing_hash_method),
        ] {
            if !signature.contains('(') || !signature.ends_with(')') {
                errors.push(format!(
                    "registry.{} '{}' is not a signature like name(type,...)",
                    name, signature
                ));
            }
        }

        if let Some(etherscan) = &self.etherscan
            && etherscan.api_url.trim().is_empty()
        {
            errors.push("registry.etherscan.api_url must not be empty".to_string());
        }

        errors
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EtherscanConfig {
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
}

// The whole config is logged at startup; keep the key out of it.
impl fmt::Debug for EtherscanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("EtherscanConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &api_key)
            .finish()
    }
}

fn default_storage_node_address() -> String {
    "127.0.0.1".to_string()
}

fn default_storage_node_port() -> u16 {
    5001
}

fn default_grace_period() -> u64 {
    24 * 60 * 60
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_provider_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_event_signature() -> String {
    "NewListing(uint256,address)".to_string()
}

fn default_listing_address_method() -> String {
    "getListingAddress(uint256)".to_string()
}

fn default_listing_hash_method() -> String {
    "ipfsHash()".to_string()
}

/// Errors that can occur when loading config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
}
