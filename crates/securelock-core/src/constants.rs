//! Core constants for the SecureLock access controller.
//!
//! This module centralizes the security policy limits, timing defaults and
//! audit reason strings shared by every crate in the workspace. Runtime
//! values are carried by [`ControllerConfig`](crate::ControllerConfig); the
//! constants here are its defaults.
//!
//! # Usage
//!
//! ```
//! use securelock_core::constants::*;
//! use std::time::Duration;
//!
//! let lockout = Duration::from_millis(LOCKOUT_DURATION_MS);
//! assert_eq!(lockout.as_secs(), 30);
//! assert_eq!(MAX_FAILED_ATTEMPTS, 3);
//! ```

// ============================================================================
// Credential Formats
// ============================================================================

/// Card identifier length in bytes.
///
/// Only single-size ISO 14443A identifiers are retrieved, so every
/// [`CardUid`](crate::CardUid) is exactly this long.
pub const UID_LENGTH: usize = 4;

/// Length of a stored PIN digest in bytes (SHA-256).
pub const PIN_HASH_LENGTH: usize = 32;

/// Minimum number of digits in a PIN.
pub const MIN_PIN_LENGTH: usize = 4;

/// Maximum number of digits in a PIN.
pub const MAX_PIN_LENGTH: usize = 6;

/// Upper bound accepted for a configured PIN length.
pub const PIN_LENGTH_LIMIT: usize = 16;

// ============================================================================
// Security Limits
// ============================================================================

/// Consecutive wrong PIN submissions that trigger a lockout.
pub const MAX_FAILED_ATTEMPTS: u8 = 3;

/// Lockout duration (milliseconds).
///
/// # Value: 30000ms (30 seconds)
pub const LOCKOUT_DURATION_MS: u64 = 30_000;

/// Session inactivity timeout (milliseconds).
///
/// A session that sees no card or PIN activity for longer than this is
/// reset to idle by the watchdog.
///
/// # Value: 10000ms (10 seconds)
pub const SESSION_TIMEOUT_MS: u64 = 10_000;

/// Time allowed for PIN entry once a valid card was presented (milliseconds).
///
/// # Value: 5000ms (5 seconds)
pub const PIN_ENTRY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// Actuator and Loop Timing
// ============================================================================

/// How long the lock stays released after a grant (milliseconds).
///
/// # Value: 3000ms (3 seconds)
pub const UNLOCK_DURATION_MS: u64 = 3_000;

/// Delay between control loop iterations (milliseconds).
pub const LOOP_PERIOD_MS: u64 = 10;

/// Upper bound on a single telemetry send (milliseconds).
///
/// Telemetry is best effort; a send that takes longer is abandoned so the
/// control loop keeps running.
pub const TELEMETRY_TIMEOUT_MS: u64 = 2_000;

/// Interval between heartbeat messages (milliseconds).
pub const HEARTBEAT_INTERVAL_MS: u64 = 10_000;

/// Button hold time that toggles maintenance mode (milliseconds).
pub const MAINTENANCE_HOLD_MS: u64 = 3_000;

// ============================================================================
// Privilege Bits
// ============================================================================

/// May release the lock with card and PIN.
pub const PRIVILEGE_UNLOCK: u8 = 0x01;

/// Administrator.
pub const PRIVILEGE_ADMIN: u8 = 0x02;

/// May issue remote commands.
pub const PRIVILEGE_REMOTE: u8 = 0x04;

/// May enroll users.
pub const PRIVILEGE_ADD_USERS: u8 = 0x08;

/// May remove users.
pub const PRIVILEGE_DELETE_USERS: u8 = 0x10;

/// May read the access log.
pub const PRIVILEGE_VIEW_LOGS: u8 = 0x20;

// ============================================================================
// Audit Reasons
// ============================================================================

/// Audit reason strings emitted by the access controller.
///
/// These appear verbatim in the telemetry stream, so back-office tooling may
/// match on them.
pub mod reasons {
    pub const SYSTEM_INITIALIZED: &str = "System initialized";
    pub const CARD_VALIDATED: &str = "RFID validated, awaiting PIN";
    pub const INVALID_CARD: &str = "Invalid RFID";
    pub const SESSION_TIMEOUT: &str = "Session timeout";
    pub const ACCESS_GRANTED: &str = "Access granted";
    pub const WRONG_PIN: &str = "Wrong PIN";
    pub const LOCKOUT: &str = "Too many failed attempts - LOCKOUT";
    pub const LOCKOUT_ENDED: &str = "Lockout period ended";
    pub const REMOTE_UNLOCK: &str = "Remote unlock";
    pub const MAINTENANCE_ENTERED: &str = "Maintenance mode entered";
    pub const MAINTENANCE_EXITED: &str = "Maintenance mode exited";
    pub const HEARTBEAT: &str = "System heartbeat OK";
}
