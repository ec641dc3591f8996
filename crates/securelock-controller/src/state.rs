//! Access controller states.
//!
//! # Normal cycle
//!
//! - Idle → CardPresented (known card)
//! - CardPresented → Authenticating (PIN submitted) → Granted | Denied | Lockout
//! - CardPresented → Idle (PIN entry or session timeout)
//! - Granted → Idle, Denied → Idle
//! - Lockout → Idle (deadline passed)
//!
//! # Overlays
//!
//! - any except Lockout, Error → Granted (remote unlock)
//! - any except Lockout, Error ⇄ Maintenance (long press)
//! - any → Error (fault), left only by an external reset
//!
//! `Authenticating`, `Granted` and `Denied` are transient: they are entered
//! and left within the handling of a single input.

use std::fmt;

use securelock_core::{CardUid, FaultError, PinHash, UserId};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// The card and user captured when a known card was presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapturedCard {
    pub uid: CardUid,
    pub user: UserId,
    pub pin_hash: PinHash,
}

/// Controller state together with the data only meaningful in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessState {
    Idle,
    CardPresented(CapturedCard),
    Authenticating(CapturedCard),
    /// `user` is `None` for a remote unlock.
    Granted { user: Option<UserId> },
    Denied { user: UserId },
    Lockout { until: Instant },
    Maintenance,
    Error(FaultError),
}

impl AccessState {
    pub fn kind(&self) -> StateKind {
        match self {
            Self::Idle => StateKind::Idle,
            Self::CardPresented(_) => StateKind::CardPresented,
            Self::Authenticating(_) => StateKind::Authenticating,
            Self::Granted { .. } => StateKind::Granted,
            Self::Denied { .. } => StateKind::Denied,
            Self::Lockout { .. } => StateKind::Lockout,
            Self::Maintenance => StateKind::Maintenance,
            Self::Error(_) => StateKind::Error,
        }
    }

    /// Card captured by the current session, if one is in progress.
    pub fn captured(&self) -> Option<&CapturedCard> {
        match self {
            Self::CardPresented(card) | Self::Authenticating(card) => Some(card),
            _ => None,
        }
    }
}

/// State names without their data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    Idle,
    CardPresented,
    Authenticating,
    Granted,
    Denied,
    Lockout,
    Maintenance,
    Error,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StateKind::Idle => "Idle",
            StateKind::CardPresented => "CardPresented",
            StateKind::Authenticating => "Authenticating",
            StateKind::Granted => "Granted",
            StateKind::Denied => "Denied",
            StateKind::Lockout => "Lockout",
            StateKind::Maintenance => "Maintenance",
            StateKind::Error => "Error",
        };
        f.write_str(name)
    }
}

/// One recorded state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: StateKind,
    pub to: StateKind,
    pub at: Instant,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> CapturedCard {
        CapturedCard {
            uid: CardUid::new([1, 2, 3, 4]),
            user: UserId::new(7),
            pin_hash: PinHash::new([0; 32]),
        }
    }

    #[test]
    fn test_captured_only_in_session_states() {
        assert!(AccessState::CardPresented(card()).captured().is_some());
        assert!(AccessState::Authenticating(card()).captured().is_some());
        assert!(AccessState::Idle.captured().is_none());
        assert!(AccessState::Granted { user: Some(UserId::new(7)) }.captured().is_none());
        assert!(AccessState::Maintenance.captured().is_none());
    }

    #[test]
    fn test_kind_display_and_serde() {
        let state = AccessState::Error(FaultError::BusFault);
        assert_eq!(state.kind().to_string(), "Error");
        assert_eq!(
            serde_json::to_string(&StateKind::CardPresented).unwrap(),
            "\"card_presented\""
        );
    }
}
