//! The access control transition function.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use securelock_core::constants::reasons;
use securelock_core::{AccessEvent, CardUid, ControllerConfig, FaultError, UserId};
use securelock_crypto::{AuditKey, CryptoProvider, seal_line};
use securelock_hardware::{ActuatorGuard, LockActuator};
use securelock_network::TelemetrySink;
use securelock_storage::UserDirectory;
use serde::Serialize;
use tokio::time::{Instant, sleep_until, timeout_at};
use tracing::{debug, error, info, warn};
use zeroize::Zeroizing;

use crate::error::Result;
use crate::session::Session;
use crate::state::{AccessState, CapturedCard, StateKind, StateTransition};

/// Recent transitions and audit events kept for inspection.
const MAX_HISTORY_SIZE: usize = 64;

/// One thing that happened, fed to [`AccessController::handle`].
pub enum AccessInput {
    /// Periodic check of the session watchdog and the lockout deadline.
    Tick,
    /// A card identifier was retrieved.
    CardRead(CardUid),
    /// A PIN was submitted.
    PinEntered(Zeroizing<String>),
    /// PIN entry expired without a submission.
    PinTimeout,
    /// Administrative unlock command.
    RemoteUnlock,
    /// Maintenance long press.
    MaintenanceToggle,
    /// Unrecoverable hardware condition.
    Fault(FaultError),
}

impl fmt::Debug for AccessInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tick => f.write_str("Tick"),
            Self::CardRead(uid) => f.debug_tuple("CardRead").field(uid).finish(),
            Self::PinEntered(_) => f.write_str("PinEntered(..)"),
            Self::PinTimeout => f.write_str("PinTimeout"),
            Self::RemoteUnlock => f.write_str("RemoteUnlock"),
            Self::MaintenanceToggle => f.write_str("MaintenanceToggle"),
            Self::Fault(fault) => f.debug_tuple("Fault").field(fault).finish(),
        }
    }
}

/// Point-in-time view of the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub state: StateKind,
    pub failed_attempts: u8,
    pub lockout_remaining: Option<Duration>,
    pub captured_user: Option<UserId>,
}

/// Owns the session and drives the actuator and audit trail.
///
/// Every state change goes through [`handle`](Self::handle) (or
/// [`reset`](Self::reset)); nothing else mutates the session.
pub struct AccessController<D, C, A, T> {
    directory: D,
    crypto: C,
    actuator: A,
    telemetry: T,
    audit_key: AuditKey,
    config: ControllerConfig,
    session: Session,
    history: VecDeque<StateTransition>,
    events: VecDeque<AccessEvent>,
}

impl<D, C, A, T> AccessController<D, C, A, T>
where
    D: UserDirectory,
    C: CryptoProvider,
    A: LockActuator,
    T: TelemetrySink,
{
    /// # Errors
    ///
    /// Returns `ControllerError::Config` if `config` does not validate.
    pub fn new(
        directory: D,
        crypto: C,
        actuator: A,
        telemetry: T,
        audit_key: AuditKey,
        config: ControllerConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            directory,
            crypto,
            actuator,
            telemetry,
            audit_key,
            config,
            session: Session::new(Instant::now()),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
            events: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> StateKind {
        self.session.kind()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }

    pub fn telemetry_mut(&mut self) -> &mut T {
        &mut self.telemetry
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Recent audit events, oldest first, whether or not telemetry took them.
    pub fn events(&self) -> &VecDeque<AccessEvent> {
        &self.events
    }

    pub fn status(&self) -> StatusSnapshot {
        let now = Instant::now();
        StatusSnapshot {
            state: self.session.kind(),
            failed_attempts: self.session.failed_attempts(),
            lockout_remaining: self
                .session
                .lockout_deadline()
                .map(|until| until.saturating_duration_since(now)),
            captured_user: self.session.captured_user(),
        }
    }

    /// Announce start-up.
    pub async fn start(&mut self) {
        info!(users = self.directory.len(), "access controller started");
        self.emit(AccessEvent::system(false, reasons::SYSTEM_INITIALIZED))
            .await;
    }

    /// External reset: a fresh session in `Idle`, from any state.
    pub async fn reset(&mut self) {
        if let Err(e) = self.actuator.deassert() {
            error!(error = %e, "failed to deassert actuator on reset");
        }
        let previous = self.session.kind();
        self.session = Session::new(Instant::now());
        self.record(previous, StateKind::Idle);
        info!(from = %previous, "controller reset");
        self.emit(AccessEvent::system(false, reasons::SYSTEM_INITIALIZED))
            .await;
    }

    /// Send an informational line (heartbeat, status report) through the
    /// audit channel.
    pub async fn report(&mut self, text: &str) {
        self.emit(AccessEvent::system(false, text)).await;
    }

    /// Apply one input. Returns the state the controller settles in.
    pub async fn handle(&mut self, input: AccessInput) -> StateKind {
        let now = Instant::now();

        if let AccessState::Error(fault) = self.session.state() {
            if !matches!(input, AccessInput::Fault(_)) {
                debug!(%fault, ?input, "input ignored in error state");
            }
            return StateKind::Error;
        }

        match input {
            AccessInput::Fault(fault) => self.enter_fault(fault).await,
            AccessInput::Tick => self.on_tick(now).await,
            AccessInput::CardRead(uid) => self.on_card(uid, now).await,
            AccessInput::PinEntered(pin) => self.on_pin(pin, now).await,
            AccessInput::PinTimeout => self.on_pin_timeout().await,
            AccessInput::RemoteUnlock => self.on_remote_unlock().await,
            AccessInput::MaintenanceToggle => self.on_maintenance_toggle().await,
        }

        self.session.kind()
    }

    async fn on_tick(&mut self, now: Instant) {
        match *self.session.state() {
            AccessState::Lockout { until } if now >= until => {
                self.session.clear_failures();
                self.transition(AccessState::Idle);
                self.emit(AccessEvent::system(false, reasons::LOCKOUT_ENDED))
                    .await;
            }
            AccessState::CardPresented(card)
                if self.session.idle_for(now) > self.config.session_timeout() =>
            {
                info!(user = %card.user, "session watchdog expired");
                self.transition(AccessState::Idle);
                self.emit(AccessEvent::new(Some(card.user), false, reasons::SESSION_TIMEOUT))
                    .await;
            }
            _ => {}
        }
    }

    async fn on_card(&mut self, uid: CardUid, now: Instant) {
        if self.session.kind() != StateKind::Idle {
            debug!(%uid, state = %self.session.kind(), "card ignored, session busy");
            return;
        }

        let Some(user) = self.directory.lookup(&uid) else {
            info!(%uid, "unknown card");
            self.emit(AccessEvent::system(false, reasons::INVALID_CARD))
                .await;
            return;
        };

        let card = CapturedCard {
            uid,
            user: user.id,
            pin_hash: user.pin_hash,
        };
        self.session.touch(now);
        self.transition(AccessState::CardPresented(card));
        self.emit(AccessEvent::new(Some(card.user), false, reasons::CARD_VALIDATED))
            .await;
    }

    async fn on_pin(&mut self, pin: Zeroizing<String>, now: Instant) {
        let AccessState::CardPresented(card) = *self.session.state() else {
            debug!(state = %self.session.kind(), "PIN ignored, no card presented");
            return;
        };

        if self.session.idle_for(now) > self.config.session_timeout() {
            info!(user = %card.user, "PIN arrived after session expiry");
            self.transition(AccessState::Idle);
            self.emit(AccessEvent::new(Some(card.user), false, reasons::SESSION_TIMEOUT))
                .await;
            return;
        }

        self.session.touch(now);
        self.transition(AccessState::Authenticating(card));

        let digest = Zeroizing::new(self.crypto.hash(pin.as_bytes()));
        if card.pin_hash.matches(&digest) {
            self.session.clear_failures();
            self.transition(AccessState::Granted {
                user: Some(card.user),
            });
            self.pulse(AccessEvent::new(Some(card.user), true, reasons::ACCESS_GRANTED))
                .await;
            self.finish_pulse(AccessState::Idle);
            return;
        }

        let failures = self.session.record_failure();
        if failures >= self.config.max_failed_attempts {
            let until = now + self.config.lockout_duration();
            warn!(user = %card.user, failures, "lockout engaged");
            self.transition(AccessState::Lockout { until });
            self.emit(AccessEvent::new(Some(card.user), false, reasons::LOCKOUT))
                .await;
        } else {
            self.transition(AccessState::Denied { user: card.user });
            self.emit(AccessEvent::new(Some(card.user), false, reasons::WRONG_PIN))
                .await;
            self.transition(AccessState::Idle);
        }
    }

    async fn on_pin_timeout(&mut self) {
        let AccessState::CardPresented(card) = *self.session.state() else {
            return;
        };
        self.transition(AccessState::Idle);
        self.emit(AccessEvent::new(Some(card.user), false, reasons::SESSION_TIMEOUT))
            .await;
    }

    async fn on_remote_unlock(&mut self) {
        if !self.config.remote_unlock_enabled {
            warn!("remote unlock rejected, disabled by configuration");
            return;
        }

        let resume = match self.session.kind() {
            StateKind::Lockout | StateKind::Error => {
                warn!(state = %self.session.kind(), "remote unlock rejected");
                return;
            }
            StateKind::Maintenance => AccessState::Maintenance,
            _ => AccessState::Idle,
        };

        self.transition(AccessState::Granted { user: None });
        self.pulse(AccessEvent::system(true, reasons::REMOTE_UNLOCK))
            .await;
        self.finish_pulse(resume);
    }

    async fn on_maintenance_toggle(&mut self) {
        match self.session.kind() {
            StateKind::Maintenance => {
                self.transition(AccessState::Idle);
                self.emit(AccessEvent::system(false, reasons::MAINTENANCE_EXITED))
                    .await;
            }
            StateKind::Lockout | StateKind::Error => {
                warn!(state = %self.session.kind(), "maintenance toggle rejected");
            }
            _ => {
                self.transition(AccessState::Maintenance);
                self.emit(AccessEvent::system(false, reasons::MAINTENANCE_ENTERED))
                    .await;
            }
        }
    }

    async fn enter_fault(&mut self, fault: FaultError) {
        error!(%fault, state = %self.session.kind(), "unrecoverable fault");
        if let Err(e) = self.actuator.deassert() {
            error!(error = %e, "failed to deassert actuator after fault");
        }
        let reason = format!("FAULT: {fault}");
        self.transition(AccessState::Error(fault));
        self.emit(AccessEvent::system(false, reason)).await;
    }

    /// Hold the lock open for the unlock duration.
    ///
    /// The release instant is fixed at assertion; the audit event is sent
    /// while the lock is open and is cut off at that instant if telemetry
    /// is slow. The actuator is released exactly once on every path,
    /// including cancellation of this future.
    async fn pulse(&mut self, event: AccessEvent) {
        let unlock = self.config.unlock_duration();
        let telemetry_timeout = self.config.telemetry_timeout();

        let outcome = match ActuatorGuard::engage(&mut self.actuator) {
            Ok(guard) => {
                let release_at = Instant::now() + unlock;
                info!(unlock_ms = unlock.as_millis() as u64, "lock released");
                push_bounded(&mut self.events, event.clone());

                let deadline = (Instant::now() + telemetry_timeout).min(release_at);
                send_audit(
                    &mut self.telemetry,
                    &self.crypto,
                    &self.audit_key,
                    deadline,
                    &event,
                )
                .await;

                sleep_until(release_at).await;
                guard.release()
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => info!("lock engaged"),
            Err(e) => {
                self.enter_fault(FaultError::Hardware(e.to_string()))
                    .await
            }
        }
    }

    fn finish_pulse(&mut self, next: AccessState) {
        if self.session.kind() == StateKind::Granted {
            self.transition(next);
        }
    }

    async fn emit(&mut self, event: AccessEvent) {
        push_bounded(&mut self.events, event.clone());
        let deadline = Instant::now() + self.config.telemetry_timeout();
        send_audit(
            &mut self.telemetry,
            &self.crypto,
            &self.audit_key,
            deadline,
            &event,
        )
        .await;
    }

    /// The single mutation point of the session state.
    fn transition(&mut self, next: AccessState) {
        let to = next.kind();
        let from = self.session.replace_state(next).kind();
        info!(%from, %to, "state transition");
        self.record(from, to);
    }

    fn record(&mut self, from: StateKind, to: StateKind) {
        push_bounded(
            &mut self.history,
            StateTransition {
                from,
                to,
                at: Instant::now(),
            },
        );
    }
}

fn push_bounded<E>(queue: &mut VecDeque<E>, item: E) {
    queue.push_back(item);
    if queue.len() > MAX_HISTORY_SIZE {
        queue.pop_front();
    }
}

/// Best-effort delivery of one audit event: encrypt, hex-encode, send, and
/// give up at `deadline`. Failures are logged, never returned.
async fn send_audit<T, C>(
    telemetry: &mut T,
    crypto: &C,
    key: &AuditKey,
    deadline: Instant,
    event: &AccessEvent,
) where
    T: TelemetrySink,
    C: CryptoProvider,
{
    let line = event.audit_line();
    info!(target: "audit", granted = event.granted, "{line}");

    let sealed = match seal_line(crypto, key, &line) {
        Ok(sealed) => sealed,
        Err(e) => {
            warn!(error = %e, "audit line encryption failed");
            return;
        }
    };

    match timeout_at(deadline, telemetry.send_log(&sealed)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "telemetry send failed"),
        Err(_) => warn!("telemetry send timed out"),
    }
}
