//! Access control state machine for the SecureLock controller.
//!
//! [`AccessController`] owns the one [`Session`] and applies
//! [`AccessInput`]s to it: card presentation, PIN entry and timeouts,
//! remote unlock, maintenance and faults. [`ControlLoop`] polls the reader,
//! the PIN input, the maintenance button and the telemetry command queue
//! and feeds the controller, one collaborator call at a time.
//!
//! # Example
//!
//! ```
//! use securelock_controller::{AccessController, AccessInput, StateKind};
//! use securelock_core::{CardUid, ControllerConfig, PinHash, Privileges, UserId, UserRecord};
//! use securelock_crypto::{AuditKey, CryptoProvider, StandardCrypto};
//! use securelock_hardware::mock::MockActuator;
//! use securelock_network::RecordingTelemetry;
//! use securelock_storage::StaticDirectory;
//! use zeroize::Zeroizing;
//!
//! #[tokio::main(flavor = "current_thread", start_paused = true)]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let uid = CardUid::new([0x12, 0x34, 0x56, 0x78]);
//!     let directory = StaticDirectory::from_records(vec![UserRecord {
//!         id: UserId::new(1),
//!         name: "alice".into(),
//!         uid,
//!         pin_hash: PinHash::new(StandardCrypto.hash(b"1234")),
//!         privileges: Privileges::UNLOCK,
//!     }])?;
//!     let (actuator, relay) = MockActuator::new();
//!     let (telemetry, _log) = RecordingTelemetry::new();
//!
//!     let mut controller = AccessController::new(
//!         directory,
//!         StandardCrypto,
//!         actuator,
//!         telemetry,
//!         AuditKey::generate(),
//!         ControllerConfig::default(),
//!     )?;
//!
//!     controller.handle(AccessInput::CardRead(uid)).await;
//!     assert_eq!(controller.state(), StateKind::CardPresented);
//!
//!     let state = controller
//!         .handle(AccessInput::PinEntered(Zeroizing::new("1234".into())))
//!         .await;
//!     assert_eq!(state, StateKind::Idle);
//!     assert_eq!(relay.assert_count(), 1);
//!     Ok(())
//! }
//! ```

pub mod control_loop;
pub mod controller;
pub mod error;
pub mod maintenance;
pub mod session;
pub mod state;

pub use control_loop::{ControlLoop, FaultSignal, LoopExit};
pub use controller::{AccessController, AccessInput, StatusSnapshot};
pub use error::{ControllerError, Result};
pub use maintenance::LongPressDetector;
pub use session::Session;
pub use state::{AccessState, CapturedCard, StateKind, StateTransition};
