use securelock_rfid::ReaderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Configuration error: {0}")]
    Config(#[from] securelock_core::Error),

    /// The reader could not be brought up at start or after a reset.
    #[error("Reader initialization failed: {0}")]
    ReaderInit(#[from] ReaderError),
}

pub type Result<T> = std::result::Result<T, ControllerError>;
