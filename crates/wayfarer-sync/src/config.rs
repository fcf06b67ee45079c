//! Sync engine configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the engine can start with zero
//! configuration.

use std::time::Duration;

use wayfarer_shared::constants::{DELIVERY_TIMEOUT_SECS, SYNC_INTERVAL_SECS};

/// Sync engine configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Interval between scheduled runs.
    /// Env: `WAYFARER_SYNC_INTERVAL_SECS`
    /// Default: 900 (15 minutes)
    pub interval: Duration,

    /// Upper bound on a single remote delivery attempt, so one
    /// unreachable endpoint cannot stall the backlog.
    /// Env: `WAYFARER_DELIVERY_TIMEOUT_SECS`
    /// Default: 10
    pub delivery_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(SYNC_INTERVAL_SECS),
            delivery_timeout: Duration::from_secs(DELIVERY_TIMEOUT_SECS),
        }
    }
}

impl SyncConfig {
    /// Build a config from the environment, falling back to defaults for
    /// unset or unparsable variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(secs) = read_secs("WAYFARER_SYNC_INTERVAL_SECS") {
            config.interval = Duration::from_secs(secs);
        }
        if let Some(secs) = read_secs("WAYFARER_DELIVERY_TIMEOUT_SECS") {
            config.delivery_timeout = Duration::from_secs(secs);
        }

        config
    }
}

fn read_secs(var: &str) -> Option<u64> {
    std::env::var(var).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.interval, Duration::from_secs(900));
        assert_eq!(config.delivery_timeout, Duration::from_secs(10));
    }
}
