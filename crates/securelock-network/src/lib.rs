//! Telemetry channel for the SecureLock access controller.
//!
//! Audit lines go out through a [`TelemetrySink`]; administrative commands
//! come back in through the same sink and are parsed into
//! [`RemoteCommand`]s.
//!
//! # Components
//!
//! - **TcpTelemetry**: newline-delimited text over TCP to a monitoring host
//! - **RecordingTelemetry**: in-memory sink for tests and the emulator
//!
//! # Example
//!
//! ```no_run
//! use securelock_network::{TcpTelemetry, TcpTelemetryConfig, TelemetrySink};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TcpTelemetryConfig {
//!     address: "127.0.0.1:7000".parse()?,
//!     ..Default::default()
//! };
//!
//! let mut telemetry = TcpTelemetry::new(config);
//! telemetry.send_log("System: System initialized").await?;
//!
//! while let Some(command) = telemetry.get_command() {
//!     println!("received {command}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod error;
pub mod recording;
pub mod sink;
pub mod tcp;

pub use command::RemoteCommand;
pub use error::{Result, TelemetryError};
pub use recording::{RecordingTelemetry, RecordingTelemetryHandle};
pub use sink::{CommandQueue, CommandSender, TelemetrySink};
pub use tcp::{TcpTelemetry, TcpTelemetryConfig};
