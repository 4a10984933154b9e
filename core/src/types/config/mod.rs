mod app;
mod gc;
mod ledger;

pub use app::{ConfigError, EtherscanConfig, PinnerConfig, RegistryConfig};
pub use gc::GcConfig;
pub use ledger::LedgerConfig;
