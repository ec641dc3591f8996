//! Telemetry selected by configuration.

use securelock_network::{
    CommandQueue, CommandSender, Result, TcpTelemetry, TcpTelemetryConfig, TelemetrySink,
};
use tracing::debug;

/// TCP monitoring host, or local-only when none is configured.
pub enum Telemetry {
    Tcp(TcpTelemetry),
    Local(LocalTelemetry),
}

impl Telemetry {
    pub fn new(tcp: Option<TcpTelemetryConfig>) -> Self {
        match tcp {
            Some(config) => Self::Tcp(TcpTelemetry::new(config)),
            None => Self::Local(LocalTelemetry::default()),
        }
    }

    /// Feeds the same queue the monitoring host writes to.
    pub fn command_sender(&self) -> CommandSender {
        match self {
            Self::Tcp(tcp) => tcp.command_sender(),
            Self::Local(local) => local.commands.sender(),
        }
    }
}

impl TelemetrySink for Telemetry {
    async fn send_log(&mut self, line: &str) -> Result<()> {
        match self {
            Self::Tcp(tcp) => tcp.send_log(line).await,
            Self::Local(local) => local.send_log(line).await,
        }
    }

    fn has_command(&self) -> bool {
        match self {
            Self::Tcp(tcp) => tcp.has_command(),
            Self::Local(local) => local.has_command(),
        }
    }

    fn get_command(&mut self) -> Option<String> {
        match self {
            Self::Tcp(tcp) => tcp.get_command(),
            Self::Local(local) => local.get_command(),
        }
    }
}

/// Drops sealed lines after logging them; commands come from the console.
#[derive(Debug, Default)]
pub struct LocalTelemetry {
    commands: CommandQueue,
}

impl TelemetrySink for LocalTelemetry {
    async fn send_log(&mut self, line: &str) -> Result<()> {
        debug!(sealed = line, "audit line");
        Ok(())
    }

    fn has_command(&self) -> bool {
        self.commands.has_command()
    }

    fn get_command(&mut self) -> Option<String> {
        self.commands.pop()
    }
}
