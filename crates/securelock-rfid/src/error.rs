//! Reader protocol errors.
//!
//! These are internal to the protocol engine: the public card operations
//! collapse every variant into "no card" / "no identifier" after logging it.

use securelock_hardware::HardwareError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReaderError>;

#[derive(Debug, Error)]
pub enum ReaderError {
    /// Bus-level failure of the transport.
    #[error("Transport error: {0}")]
    Transport(#[from] HardwareError),

    /// No completion before the deadline, or the chip's own timer expired
    /// because the card stayed silent.
    #[error("Transceive timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The error register flagged a framing, collision, parity, CRC or
    /// buffer fault. `status` is the raw register value.
    #[error("Chip reported error status {status:#04x}")]
    Protocol { status: u8 },
}

impl ReaderError {
    /// True for failures that only mean no card answered in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
