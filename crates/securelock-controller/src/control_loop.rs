//! The single cooperative control loop.
//!
//! One iteration, in order: pending fault, remote commands, maintenance
//! button, watchdog tick, then card polling (`Idle`) or PIN entry
//! (`CardPresented`), then the heartbeat. Every collaborator call runs to
//! completion before the next one starts.

use std::time::Duration;

use securelock_core::FaultError;
use securelock_core::constants::reasons;
use securelock_crypto::CryptoProvider;
use securelock_hardware::{LockActuator, MaintenanceButton, PinInput, ReaderTransport};
use securelock_network::{RemoteCommand, TelemetrySink};
use securelock_rfid::Mfrc522;
use securelock_storage::UserDirectory;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::controller::{AccessController, AccessInput};
use crate::error::Result;
use crate::maintenance::LongPressDetector;
use crate::state::{AccessState, StateKind};

/// Why [`ControlLoop::run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// A command the application must handle (`STATUS`, `REBOOT`).
    Command(RemoteCommand),
    /// The controller entered `Error`; only a reset continues.
    Faulted(FaultError),
}

/// Raises faults into a running loop, as a platform fault handler would.
/// Cheap to clone.
#[derive(Debug, Clone)]
pub struct FaultSignal {
    tx: mpsc::UnboundedSender<FaultError>,
}

impl FaultSignal {
    /// Returns `false` once the loop is gone.
    pub fn raise(&self, fault: FaultError) -> bool {
        self.tx.send(fault).is_ok()
    }
}

/// Drives an [`AccessController`] from the reader, PIN input, maintenance
/// button and telemetry command queue.
pub struct ControlLoop<R, P, B, D, C, A, T> {
    controller: AccessController<D, C, A, T>,
    reader: Mfrc522<R>,
    pin_input: P,
    button: B,
    long_press: LongPressDetector,
    faults_tx: mpsc::UnboundedSender<FaultError>,
    faults_rx: mpsc::UnboundedReceiver<FaultError>,
    started_at: Instant,
    last_heartbeat: Instant,
}

impl<R, P, B, D, C, A, T> ControlLoop<R, P, B, D, C, A, T>
where
    R: ReaderTransport,
    P: PinInput,
    B: MaintenanceButton,
    D: UserDirectory,
    C: CryptoProvider,
    A: LockActuator,
    T: TelemetrySink,
{
    pub fn new(
        controller: AccessController<D, C, A, T>,
        reader: Mfrc522<R>,
        pin_input: P,
        button: B,
    ) -> Self {
        let hold = controller.config().maintenance_hold();
        let (faults_tx, faults_rx) = mpsc::unbounded_channel();
        let now = Instant::now();
        Self {
            controller,
            reader,
            pin_input,
            button,
            long_press: LongPressDetector::new(hold),
            faults_tx,
            faults_rx,
            started_at: now,
            last_heartbeat: now,
        }
    }

    pub fn controller(&self) -> &AccessController<D, C, A, T> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut AccessController<D, C, A, T> {
        &mut self.controller
    }

    pub fn reader(&self) -> &Mfrc522<R> {
        &self.reader
    }

    pub fn fault_signal(&self) -> FaultSignal {
        FaultSignal {
            tx: self.faults_tx.clone(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Bring up the reader and announce start-up.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::ReaderInit` if the reader does not respond.
    pub async fn start(&mut self) -> Result<()> {
        self.reader.init().await?;
        self.controller.start().await;
        let now = Instant::now();
        self.started_at = now;
        self.last_heartbeat = now;
        Ok(())
    }

    /// External reset: reinitialize the reader and restart the session.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::ReaderInit` if the reader does not respond.
    pub async fn reset(&mut self) -> Result<()> {
        while self.faults_rx.try_recv().is_ok() {}
        self.long_press = LongPressDetector::new(self.controller.config().maintenance_hold());
        self.reader.init().await?;
        self.controller.reset().await;
        let now = Instant::now();
        self.started_at = now;
        self.last_heartbeat = now;
        Ok(())
    }

    /// Answer to `STATUS`: `Uptime: <s>s, Failures: <n>`.
    pub fn status_line(&self) -> String {
        format!(
            "Uptime: {}s, Failures: {}",
            self.uptime().as_secs(),
            self.controller.session().failed_attempts()
        )
    }

    /// Iterate until the application has to step in.
    pub async fn run(&mut self) -> LoopExit {
        loop {
            if let Some(exit) = self.step().await {
                return exit;
            }
            sleep(self.controller.config().loop_period()).await;
        }
    }

    /// One loop iteration.
    pub async fn step(&mut self) -> Option<LoopExit> {
        if let Ok(fault) = self.faults_rx.try_recv() {
            self.controller.handle(AccessInput::Fault(fault)).await;
        }
        if let Some(exit) = self.faulted() {
            return Some(exit);
        }

        if let Some(command) = self.process_commands().await {
            return Some(LoopExit::Command(command));
        }

        self.poll_button().await;
        self.controller.handle(AccessInput::Tick).await;

        match self.controller.state() {
            StateKind::Idle => self.poll_card().await,
            StateKind::CardPresented => self.poll_pin().await,
            _ => {}
        }

        self.heartbeat().await;
        self.faulted()
    }

    fn faulted(&self) -> Option<LoopExit> {
        match self.controller.session().state() {
            AccessState::Error(fault) => Some(LoopExit::Faulted(fault.clone())),
            _ => None,
        }
    }

    /// Apply queued commands; stop at the first one the application owns.
    async fn process_commands(&mut self) -> Option<RemoteCommand> {
        while self.controller.telemetry().has_command() {
            let Some(line) = self.controller.telemetry_mut().get_command() else {
                break;
            };
            match RemoteCommand::parse(&line) {
                RemoteCommand::Unlock => {
                    info!("remote unlock requested");
                    self.controller.handle(AccessInput::RemoteUnlock).await;
                }
                RemoteCommand::Unknown(other) => {
                    warn!(command = %other, "unknown remote command ignored");
                }
                command => return Some(command),
            }
        }
        None
    }

    async fn poll_button(&mut self) {
        let pressed = match self.button.is_pressed() {
            Ok(pressed) => pressed,
            Err(e) => {
                warn!(error = %e, "maintenance button unreadable");
                false
            }
        };
        if self.long_press.update(pressed, Instant::now()) {
            self.controller.handle(AccessInput::MaintenanceToggle).await;
        }
    }

    async fn poll_card(&mut self) {
        if !self.reader.detect_card().await {
            return;
        }
        let uid = self.reader.read_uid().await;
        self.reader.halt().await;
        match uid {
            Some(uid) => {
                debug!(%uid, "card read");
                self.controller.handle(AccessInput::CardRead(uid)).await;
            }
            None => debug!("card detected but identifier unreadable"),
        }
    }

    async fn poll_pin(&mut self) {
        let config = self.controller.config();
        let (max_len, timeout) = (config.pin_max_len, config.pin_entry_timeout());

        match self.pin_input.read_pin(max_len, timeout).await {
            Ok(Some(pin)) => {
                self.controller.handle(AccessInput::PinEntered(pin)).await;
            }
            Ok(None) => {
                self.controller.handle(AccessInput::PinTimeout).await;
            }
            Err(e) => warn!(error = %e, "PIN input failed"),
        }
    }

    async fn heartbeat(&mut self) {
        let Some(interval) = self.controller.config().heartbeat_interval() else {
            return;
        };
        let now = Instant::now();
        if now.saturating_duration_since(self.last_heartbeat) >= interval {
            self.last_heartbeat = now;
            self.controller.report(reasons::HEARTBEAT).await;
        }
    }
}
