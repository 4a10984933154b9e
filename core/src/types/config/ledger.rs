use super::PinnerConfig;
use std::path::PathBuf;

/// Location of the ledger database.
#[derive(Clone, Debug)]
pub struct LedgerConfig {
    pub ledger_path: PathBuf,
}

impl From<&PinnerConfig> for LedgerConfig {
    fn from(config: &PinnerConfig) -> Self {
        Self {
            ledger_path: config.ledger_path.clone(),
        }
    }
}
