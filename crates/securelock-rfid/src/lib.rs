//! MFRC522 proximity card reader support.
//!
//! [`Mfrc522`] is the reader protocol engine: it turns the byte channel of
//! a [`ReaderTransport`](securelock_hardware::ReaderTransport) into register
//! accesses, FIFO frame exchanges and the two operations the access
//! controller needs, card presence detection and single-size identifier
//! retrieval.
//!
//! [`sim::SimulatedMfrc522`] is a register-level model of the chip with an
//! ISO 14443A card in its field, used by the tests and the emulator binary.
//!
//! # Example
//!
//! ```
//! use securelock_core::CardUid;
//! use securelock_rfid::{Mfrc522, ReaderConfig, sim::SimulatedMfrc522};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> securelock_rfid::Result<()> {
//!     let (chip, handle) = SimulatedMfrc522::new();
//!     let mut reader = Mfrc522::new(chip, ReaderConfig::default());
//!     reader.init().await?;
//!
//!     handle.present_card(CardUid::new([0x12, 0x34, 0x56, 0x78]));
//!
//!     assert!(reader.detect_card().await);
//!     assert_eq!(reader.read_uid().await, Some(CardUid::new([0x12, 0x34, 0x56, 0x78])));
//!     reader.halt().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod mfrc522;
pub mod registers;
pub mod sim;

pub use config::ReaderConfig;
pub use error::{ReaderError, Result};
pub use mfrc522::Mfrc522;
