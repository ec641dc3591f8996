use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default completion deadline for one transceive (milliseconds).
pub const DEFAULT_TRANSCEIVE_TIMEOUT_MS: u64 = 25;

/// Default delay between completion polls (milliseconds).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1;

/// Settle time after a `SoftReset` command (milliseconds).
pub const DEFAULT_SOFT_RESET_DELAY_MS: u64 = 50;

/// Timing of the reader protocol engine.
///
/// The transceive deadline is wall-clock time, so it means the same thing
/// regardless of bus speed or CPU clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub transceive_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub soft_reset_delay_ms: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            transceive_timeout_ms: DEFAULT_TRANSCEIVE_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            soft_reset_delay_ms: DEFAULT_SOFT_RESET_DELAY_MS,
        }
    }
}

impl ReaderConfig {
    pub fn transceive_timeout(&self) -> Duration {
        Duration::from_millis(self.transceive_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn soft_reset_delay(&self) -> Duration {
        Duration::from_millis(self.soft_reset_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_config_from_partial_json() {
        let config: ReaderConfig =
            serde_json::from_str(r#"{ "transceive_timeout_ms": 40 }"#).unwrap();
        assert_eq!(config.transceive_timeout(), Duration::from_millis(40));
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
    }
}
