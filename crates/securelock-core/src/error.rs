use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Credential errors
    #[error("Invalid card UID: {0}")]
    InvalidCardUid(String),

    #[error("Invalid PIN hash: {0}")]
    InvalidPinHash(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Unrecoverable hardware condition reported by the platform fault handlers.
///
/// A fault forces the access controller into its terminal error state; only
/// an external reset brings it back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FaultError {
    #[error("bus fault")]
    BusFault,

    #[error("memory management fault")]
    MemoryFault,

    #[error("hard fault")]
    HardFault,

    #[error("usage fault")]
    UsageFault,

    #[error("hardware failure: {0}")]
    Hardware(String),
}
