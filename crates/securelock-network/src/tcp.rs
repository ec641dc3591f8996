//! Line-oriented TCP telemetry client.
//!
//! Each audit line is written as one `\n`-terminated line. Lines received
//! from the server are administrative commands; a background task reads
//! them into the [`CommandQueue`] so [`has_command`](TelemetrySink::has_command)
//! never blocks the control loop.
//!
//! # Design
//!
//! - **Lazy connect**: the first `send_log` connects; a failed write or an
//!   ended command stream drops the connection and the next `send_log`
//!   reconnects
//! - **No retry within a call**: a failed send is reported, not repeated
//! - **Bounded I/O**: connect and write are each limited by `timeout`

use std::net::SocketAddr;
use std::time::Duration;

use bytes::BytesMut;
use futures::SinkExt;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::task::JoinHandle;
use tokio_util::codec::{Decoder, FramedWrite, LinesCodec, LinesCodecError};
use tracing::{debug, info, trace, warn};

use crate::error::{Result, TelemetryError};
use crate::sink::{CommandQueue, CommandSender, TelemetrySink};

/// Longest command line accepted from the server.
const MAX_COMMAND_LENGTH: usize = 256;

/// Configuration for the TCP telemetry client.
///
/// # Example
///
/// ```
/// use securelock_network::TcpTelemetryConfig;
///
/// let config: TcpTelemetryConfig = serde_json::from_str(
///     r#"{ "address": "10.0.0.5:7000", "timeout_ms": 500 }"#,
/// ).unwrap();
/// assert_eq!(config.timeout().as_millis(), 500);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TcpTelemetryConfig {
    /// Monitoring host
    pub address: SocketAddr,

    /// Limit for connect and for each write (milliseconds)
    pub timeout_ms: u64,
}

impl Default for TcpTelemetryConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from(([127, 0, 0, 1], 7000)),
            timeout_ms: 1000,
        }
    }
}

impl TcpTelemetryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// TCP telemetry client.
pub struct TcpTelemetry {
    config: TcpTelemetryConfig,
    writer: Option<FramedWrite<OwnedWriteHalf, LinesCodec>>,
    reader: Option<JoinHandle<()>>,
    commands: CommandQueue,
}

impl TcpTelemetry {
    /// Create an unconnected client. The first `send_log` connects.
    pub fn new(config: TcpTelemetryConfig) -> Self {
        debug!("Creating telemetry client for {}", config.address);
        Self {
            config,
            writer: None,
            reader: None,
            commands: CommandQueue::new(),
        }
    }

    /// True while both the write half and the command reader are alive.
    pub fn is_connected(&self) -> bool {
        self.writer.is_some()
            && self
                .reader
                .as_ref()
                .is_some_and(|reader| !reader.is_finished())
    }

    /// Producer for injecting commands locally, as if the server sent them.
    pub fn command_sender(&self) -> CommandSender {
        self.commands.sender()
    }

    /// Connect to the monitoring host, replacing any previous connection.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionTimeout` if the host does not accept within the
    /// configured timeout, or the I/O error of a refused connection.
    pub async fn connect(&mut self) -> Result<()> {
        self.disconnect();
        info!("Connecting to telemetry server at {}", self.config.address);

        let timeout = self.config.timeout();
        let stream = match tokio::time::timeout(timeout, TcpStream::connect(self.config.address))
            .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                warn!("Telemetry connection failed: {}", e);
                return Err(e.into());
            }
            Err(_) => {
                warn!("Telemetry connection timeout after {}ms", timeout.as_millis());
                return Err(TelemetryError::ConnectionTimeout(timeout.as_millis() as u64));
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        let (read_half, write_half) = stream.into_split();
        self.reader = Some(tokio::spawn(read_commands(
            read_half,
            self.commands.sender(),
        )));
        self.writer = Some(FramedWrite::new(write_half, LinesCodec::new()));

        info!("Connected to telemetry server at {}", self.config.address);
        Ok(())
    }

    /// Drop the connection. Idempotent.
    pub fn disconnect(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        if self.writer.take().is_some() {
            debug!("Telemetry connection closed");
        }
    }
}

/// Queue every command line the server sends until the stream ends.
///
/// An overlong line is discarded up to its newline and reading goes on; an
/// I/O error or EOF ends the task, which marks the connection dead.
async fn read_commands(mut read_half: OwnedReadHalf, sender: CommandSender) {
    let mut codec = LinesCodec::new_with_max_length(MAX_COMMAND_LENGTH);
    let mut buf = BytesMut::with_capacity(MAX_COMMAND_LENGTH);

    loop {
        match read_half.read_buf(&mut buf).await {
            Ok(0) => {
                while let Ok(Some(line)) = codec.decode_eof(&mut buf) {
                    if !queue_command(&sender, line) {
                        break;
                    }
                }
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Telemetry command stream failed: {}", e);
                break;
            }
        }

        loop {
            match codec.decode(&mut buf) {
                Ok(Some(line)) => {
                    if !queue_command(&sender, line) {
                        return;
                    }
                }
                Ok(None) => break,
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    warn!(
                        max = MAX_COMMAND_LENGTH,
                        "Discarding overlong telemetry command"
                    );
                }
                Err(e) => {
                    warn!("Dropping telemetry command stream: {}", e);
                    return;
                }
            }
        }
    }
    debug!("Telemetry command stream closed");
}

/// False once the queue is gone.
fn queue_command(sender: &CommandSender, line: String) -> bool {
    if line.trim().is_empty() {
        return true;
    }
    trace!(command = %line, "Command received");
    sender.push(line)
}

impl TelemetrySink for TcpTelemetry {
    async fn send_log(&mut self, line: &str) -> Result<()> {
        if !self.is_connected() {
            if self.writer.is_some() {
                debug!("Telemetry command stream ended, reconnecting");
            }
            self.connect().await?;
        }
        let timeout = self.config.timeout();
        let writer = self.writer.as_mut().ok_or(TelemetryError::NotConnected)?;

        match tokio::time::timeout(timeout, writer.send(line)).await {
            Ok(Ok(())) => {
                trace!(len = line.len(), "Telemetry line sent");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!("Telemetry write failed: {}", e);
                self.disconnect();
                Err(e.into())
            }
            Err(_) => {
                warn!("Telemetry write timeout after {}ms", timeout.as_millis());
                self.disconnect();
                Err(TelemetryError::WriteTimeout(timeout.as_millis() as u64))
            }
        }
    }

    fn has_command(&self) -> bool {
        self.commands.has_command()
    }

    fn get_command(&mut self) -> Option<String> {
        self.commands.pop()
    }
}

impl Drop for TcpTelemetry {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = TcpTelemetryConfig::default();
        assert_eq!(config.address.port(), 7000);
        assert_eq!(config.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_client_not_connected_initially() {
        let client = TcpTelemetry::new(TcpTelemetryConfig::default());
        assert!(!client.is_connected());
        assert!(!client.has_command());
    }

    #[tokio::test]
    async fn test_connection_timeout() {
        // Non-routable address (RFC 5737 TEST-NET-1)
        let mut client = TcpTelemetry::new(TcpTelemetryConfig {
            address: "192.0.2.1:9999".parse().unwrap(),
            timeout_ms: 100,
        });

        let result = client.send_log("System: System initialized").await;
        assert!(matches!(
            result,
            Err(TelemetryError::ConnectionTimeout(_)) | Err(TelemetryError::Io(_))
        ));
        assert!(!client.is_connected());
    }

    #[test]
    fn test_disconnect_when_not_connected() {
        let mut client = TcpTelemetry::new(TcpTelemetryConfig::default());
        client.disconnect();
        client.disconnect();
        assert!(!client.is_connected());
    }
}
