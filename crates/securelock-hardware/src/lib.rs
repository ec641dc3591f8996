//! Hardware abstraction layer for the SecureLock access controller.
//!
//! This crate defines the peripheral contracts the controller is written
//! against, plus the pieces of logic that sit directly on top of them:
//!
//! - [`ReaderTransport`]: byte exchange with the card reader chip, chip
//!   select and reset line.
//! - [`KeypadDevice`] and [`PinInput`]: raw key presses and the assembled
//!   PIN ([`KeypadPinReader`] bridges the two).
//! - [`LockActuator`]: the lock release relay.
//! - [`MaintenanceButton`]: the long-press maintenance trigger.
//!
//! # Design Philosophy
//!
//! - **Async where it blocks**: byte exchange and key reads are native
//!   `async fn` in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Sync where it must release**: chip select and the relay are driven
//!   synchronously so the scoped guards in [`guard`] can release them from
//!   `Drop`.
//! - **Error-aware**: all operations return [`Result<T>`] with
//!   [`HardwareError`].
//!
//! # Mock Implementations
//!
//! The [`mock`] module provides programmable keypad, relay and button
//! doubles for tests and the emulator binary.

pub mod error;
pub mod guard;
pub mod keypad;
pub mod mock;
pub mod traits;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use guard::{ActuatorGuard, ChipSelect};
pub use keypad::KeypadPinReader;
pub use traits::{
    KeypadDevice, KeypadInput, LockActuator, MaintenanceButton, PinInput, ReaderTransport,
};
