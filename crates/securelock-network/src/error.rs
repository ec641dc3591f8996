use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Errors that can occur while shipping telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// No connection to the monitoring host
    #[error("Not connected to telemetry server")]
    NotConnected,

    /// Connection attempt timed out
    #[error("Connection timeout after {0}ms")]
    ConnectionTimeout(u64),

    /// Write did not complete in time
    #[error("Write timeout after {0}ms")]
    WriteTimeout(u64),

    /// Connection dropped or the sink refused the line
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Line framing failed
    #[error("Codec error: {0}")]
    Codec(#[from] LinesCodecError),

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
