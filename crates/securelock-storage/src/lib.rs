//! User directory for the SecureLock access controller.
//!
//! The directory is loaded once at startup and never mutated afterwards:
//! the controller only looks users up by card identifier. Records come
//! from a JSON file or are built in code for tests.
//!
//! # Examples
//!
//! ```
//! use securelock_core::{CardUid, PinHash, Privileges, UserId, UserRecord};
//! use securelock_storage::{StaticDirectory, UserDirectory};
//!
//! let alice = UserRecord {
//!     id: UserId::new(1),
//!     name: "alice".into(),
//!     uid: CardUid::new([0x12, 0x34, 0x56, 0x78]),
//!     pin_hash: PinHash::new([0; 32]),
//!     privileges: Privileges::UNLOCK,
//! };
//! let directory = StaticDirectory::from_records(vec![alice]).unwrap();
//!
//! let uid: CardUid = "12 34 56 78".parse().unwrap();
//! assert_eq!(directory.lookup(&uid).map(|u| u.id), Some(UserId::new(1)));
//! ```

pub mod directory;
pub mod error;

pub use directory::{StaticDirectory, UserDirectory};
pub use error::{StorageError, StorageResult};
