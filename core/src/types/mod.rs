pub(crate) mod config;
pub use config::{
    ConfigError, EtherscanConfig, GcConfig, LedgerConfig, PinnerConfig, RegistryConfig,
};

pub(crate) mod content_hash;
pub use content_hash::{ContentHash, ContentHashError};

pub(crate) mod record;
pub use record::latest_record::PinRecord;
