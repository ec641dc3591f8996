//! Runtime policy configuration for the access controller.
//!
//! Durations are stored in milliseconds so the struct maps one-to-one onto
//! a TOML `[controller]` table. Missing keys fall back to the defaults in
//! [`constants`](crate::constants).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    HEARTBEAT_INTERVAL_MS, LOCKOUT_DURATION_MS, LOOP_PERIOD_MS, MAINTENANCE_HOLD_MS,
    MAX_FAILED_ATTEMPTS, MAX_PIN_LENGTH, MIN_PIN_LENGTH, PIN_ENTRY_TIMEOUT_MS, PIN_LENGTH_LIMIT,
    SESSION_TIMEOUT_MS, TELEMETRY_TIMEOUT_MS, UNLOCK_DURATION_MS,
};
use crate::{Error, Result};

/// Access controller policy.
///
/// # Examples
///
/// ```
/// use securelock_core::ControllerConfig;
/// use std::time::Duration;
///
/// let config = ControllerConfig::default();
/// assert_eq!(config.unlock_duration(), Duration::from_secs(3));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Wrong PINs tolerated before a lockout.
    pub max_failed_attempts: u8,

    pub lockout_duration_ms: u64,

    /// Inactivity limit for a live session.
    pub session_timeout_ms: u64,

    /// Time allowed to finish typing a PIN.
    pub pin_entry_timeout_ms: u64,

    /// How long the lock is held open on a grant.
    pub unlock_duration_ms: u64,

    /// Maximum PIN digits accepted from the keypad.
    pub pin_max_len: usize,

    pub loop_period_ms: u64,

    /// Per-send bound for best-effort telemetry.
    pub telemetry_timeout_ms: u64,

    /// Zero disables the heartbeat.
    pub heartbeat_interval_ms: u64,

    /// Long-press duration that toggles maintenance mode.
    pub maintenance_hold_ms: u64,

    /// Whether the `UNLOCK` administrative command is honoured.
    pub remote_unlock_enabled: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: MAX_FAILED_ATTEMPTS,
            lockout_duration_ms: LOCKOUT_DURATION_MS,
            session_timeout_ms: SESSION_TIMEOUT_MS,
            pin_entry_timeout_ms: PIN_ENTRY_TIMEOUT_MS,
            unlock_duration_ms: UNLOCK_DURATION_MS,
            pin_max_len: MAX_PIN_LENGTH,
            loop_period_ms: LOOP_PERIOD_MS,
            telemetry_timeout_ms: TELEMETRY_TIMEOUT_MS,
            heartbeat_interval_ms: HEARTBEAT_INTERVAL_MS,
            maintenance_hold_ms: MAINTENANCE_HOLD_MS,
            remote_unlock_enabled: true,
        }
    }
}

impl ControllerConfig {
    /// Check that the policy is usable.
    ///
    /// # Errors
    /// Returns `Error::Config` if the attempt limit or any of the timing
    /// values that drive state transitions is zero, if PIN entry may outlast
    /// the session timeout, or if the PIN length falls outside the accepted
    /// range.
    pub fn validate(&self) -> Result<()> {
        if self.max_failed_attempts == 0 {
            return Err(Error::Config(
                "max_failed_attempts must be at least 1".to_string(),
            ));
        }

        let durations = [
            ("lockout_duration_ms", self.lockout_duration_ms),
            ("session_timeout_ms", self.session_timeout_ms),
            ("pin_entry_timeout_ms", self.pin_entry_timeout_ms),
            ("unlock_duration_ms", self.unlock_duration_ms),
            ("telemetry_timeout_ms", self.telemetry_timeout_ms),
            ("maintenance_hold_ms", self.maintenance_hold_ms),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, value)| *value == 0) {
            return Err(Error::Config(format!("{name} must be greater than zero")));
        }

        if self.pin_entry_timeout_ms > self.session_timeout_ms {
            return Err(Error::Config(format!(
                "pin_entry_timeout_ms ({}) must not exceed session_timeout_ms ({})",
                self.pin_entry_timeout_ms, self.session_timeout_ms
            )));
        }

        if !(MIN_PIN_LENGTH..=PIN_LENGTH_LIMIT).contains(&self.pin_max_len) {
            return Err(Error::Config(format!(
                "pin_max_len must be {MIN_PIN_LENGTH}-{PIN_LENGTH_LIMIT}, got {}",
                self.pin_max_len
            )));
        }

        Ok(())
    }

    pub fn lockout_duration(&self) -> Duration {
        Duration::from_millis(self.lockout_duration_ms)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }

    pub fn pin_entry_timeout(&self) -> Duration {
        Duration::from_millis(self.pin_entry_timeout_ms)
    }

    pub fn unlock_duration(&self) -> Duration {
        Duration::from_millis(self.unlock_duration_ms)
    }

    pub fn loop_period(&self) -> Duration {
        Duration::from_millis(self.loop_period_ms)
    }

    pub fn telemetry_timeout(&self) -> Duration {
        Duration::from_millis(self.telemetry_timeout_ms)
    }

    /// `None` when the heartbeat is disabled.
    pub fn heartbeat_interval(&self) -> Option<Duration> {
        (self.heartbeat_interval_ms > 0).then(|| Duration::from_millis(self.heartbeat_interval_ms))
    }

    pub fn maintenance_hold(&self) -> Duration {
        Duration::from_millis(self.maintenance_hold_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_match_constants() {
        let config = ControllerConfig::default();
        assert_eq!(config.max_failed_attempts, 3);
        assert_eq!(config.lockout_duration(), Duration::from_secs(30));
        assert_eq!(config.session_timeout(), Duration::from_secs(10));
        assert_eq!(config.pin_entry_timeout(), Duration::from_secs(5));
        assert_eq!(config.heartbeat_interval(), Some(Duration::from_secs(10)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: ControllerConfig =
            serde_json::from_str(r#"{ "max_failed_attempts": 5, "heartbeat_interval_ms": 0 }"#)
                .unwrap();
        assert_eq!(config.max_failed_attempts, 5);
        assert_eq!(config.unlock_duration_ms, UNLOCK_DURATION_MS);
        assert_eq!(config.heartbeat_interval(), None);
    }

    #[rstest]
    #[case(ControllerConfig { max_failed_attempts: 0, ..Default::default() })]
    #[case(ControllerConfig { lockout_duration_ms: 0, ..Default::default() })]
    #[case(ControllerConfig { unlock_duration_ms: 0, ..Default::default() })]
    #[case(ControllerConfig { session_timeout_ms: 3_000, pin_entry_timeout_ms: 5_000, ..Default::default() })]
    #[case(ControllerConfig { pin_max_len: 3, ..Default::default() })]
    #[case(ControllerConfig { pin_max_len: 17, ..Default::default() })]
    fn test_invalid_config(#[case] config: ControllerConfig) {
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
