use std::time::Duration;

use securelock_core::{CardUid, UserId};
use tokio::time::Instant;

use crate::state::{AccessState, StateKind};

/// The one live authentication session.
///
/// Owned by [`AccessController`](crate::AccessController) and changed only
/// inside its transition handling. The captured card and the lockout
/// deadline live in the [`AccessState`] itself, so they cannot outlive the
/// states they belong to.
#[derive(Debug, Clone)]
pub struct Session {
    state: AccessState,
    last_activity: Instant,
    failed_attempts: u8,
}

impl Session {
    pub fn new(now: Instant) -> Self {
        Self {
            state: AccessState::Idle,
            last_activity: now,
            failed_attempts: 0,
        }
    }

    pub fn state(&self) -> &AccessState {
        &self.state
    }

    pub fn kind(&self) -> StateKind {
        self.state.kind()
    }

    pub fn captured_uid(&self) -> Option<CardUid> {
        self.state.captured().map(|card| card.uid)
    }

    pub fn captured_user(&self) -> Option<UserId> {
        self.state.captured().map(|card| card.user)
    }

    pub fn lockout_deadline(&self) -> Option<Instant> {
        match self.state {
            AccessState::Lockout { until } => Some(until),
            _ => None,
        }
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub fn failed_attempts(&self) -> u8 {
        self.failed_attempts
    }

    /// Time since the last card or PIN activity.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    pub(crate) fn replace_state(&mut self, state: AccessState) -> AccessState {
        std::mem::replace(&mut self.state, state)
    }

    pub(crate) fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    pub(crate) fn record_failure(&mut self) -> u8 {
        self.failed_attempts = self.failed_attempts.saturating_add(1);
        self.failed_attempts
    }

    pub(crate) fn clear_failures(&mut self) {
        self.failed_attempts = 0;
    }
}
