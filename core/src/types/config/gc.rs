use super::PinnerConfig;
use std::time::Duration;

/// Grace period passed to reconciliation runs.
#[derive(Clone, Copy, Debug)]
pub struct GcConfig {
    pub grace_period: Duration,
}

impl From<&PinnerConfig> for GcConfig {
    fn from(config: &PinnerConfig) -> Self {
        Self {
            grace_period: Duration::from_secs(config.grace_period),
        }
    }
}
