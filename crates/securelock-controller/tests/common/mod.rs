#![allow(dead_code)]

use securelock_controller::{AccessController, AccessInput, StateKind};
use securelock_core::{CardUid, ControllerConfig, PinHash, Privileges, UserId, UserRecord};
use securelock_crypto::{AuditKey, CryptoProvider, StandardCrypto, open_line};
use securelock_hardware::mock::{MockActuator, MockActuatorHandle};
use securelock_network::{RecordingTelemetry, RecordingTelemetryHandle};
use securelock_storage::StaticDirectory;
use zeroize::Zeroizing;

pub const UID: CardUid = CardUid::new([0x12, 0x34, 0x56, 0x78]);
pub const OTHER_UID: CardUid = CardUid::new([0xCA, 0xFE, 0xBA, 0xBE]);
pub const UNKNOWN_UID: CardUid = CardUid::new([0x00, 0x00, 0x00, 0x00]);
pub const PIN: &str = "1234";
pub const WRONG_PIN: &str = "9999";
pub const KEY: [u8; 32] = [0x42; 32];

pub type TestController =
    AccessController<StaticDirectory, StandardCrypto, MockActuator, RecordingTelemetry>;

pub fn directory() -> StaticDirectory {
    StaticDirectory::from_records(vec![
        UserRecord {
            id: UserId::new(1),
            name: "alice".into(),
            uid: UID,
            pin_hash: PinHash::new(StandardCrypto.hash(PIN.as_bytes())),
            privileges: Privileges::UNLOCK,
        },
        UserRecord {
            id: UserId::new(2),
            name: "bob".into(),
            uid: OTHER_UID,
            pin_hash: PinHash::new(StandardCrypto.hash(b"5678")),
            privileges: Privileges::UNLOCK | Privileges::ADMIN,
        },
    ])
    .unwrap()
}

pub struct Fixture {
    pub controller: TestController,
    pub relay: MockActuatorHandle,
    pub telemetry: RecordingTelemetryHandle,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(ControllerConfig::default())
    }

    pub fn with_config(config: ControllerConfig) -> Self {
        let (actuator, relay) = MockActuator::new();
        let (telemetry_sink, telemetry) = RecordingTelemetry::new();
        let controller = AccessController::new(
            directory(),
            StandardCrypto,
            actuator,
            telemetry_sink,
            AuditKey::new(KEY),
            config,
        )
        .unwrap();
        Self {
            controller,
            relay,
            telemetry,
        }
    }

    /// Decrypted audit lines received by telemetry, oldest first.
    pub fn audit(&self) -> Vec<String> {
        audit_lines(&self.telemetry)
    }

    /// Present `uid` and enter `pin`.
    pub async fn attempt(&mut self, uid: CardUid, pin: &str) -> StateKind {
        self.controller.handle(AccessInput::CardRead(uid)).await;
        self.controller.handle(pin_input(pin)).await
    }

    /// `(from, to)` pairs of the recorded transitions.
    pub fn transitions(&self) -> Vec<(StateKind, StateKind)> {
        self.controller
            .history()
            .iter()
            .map(|t| (t.from, t.to))
            .collect()
    }
}

pub fn audit_lines(telemetry: &RecordingTelemetryHandle) -> Vec<String> {
    let key = AuditKey::new(KEY);
    telemetry
        .lines()
        .iter()
        .map(|sealed| open_line(&key, sealed).unwrap())
        .collect()
}

pub fn pin_input(pin: &str) -> AccessInput {
    AccessInput::PinEntered(Zeroizing::new(pin.to_owned()))
}
