//! The telemetry sink contract and its inbound command queue.

#![allow(async_fn_in_trait)]

use tokio::sync::mpsc;

use crate::error::Result;

/// Outbound audit lines plus inbound administrative commands.
///
/// `send_log` is best effort from the controller's point of view: callers
/// bound it with a timeout and never let its failure abort a transition.
pub trait TelemetrySink: Send {
    /// Ship one line.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is unavailable or the write fails.
    async fn send_log(&mut self, line: &str) -> Result<()>;

    /// True if at least one command is waiting.
    fn has_command(&self) -> bool;

    /// Next waiting command line, oldest first.
    fn get_command(&mut self) -> Option<String>;
}

/// FIFO of received command lines. Never blocks.
#[derive(Debug)]
pub struct CommandQueue {
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
}

impl CommandQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// A producer feeding this queue.
    pub fn sender(&self) -> CommandSender {
        CommandSender {
            tx: self.tx.clone(),
        }
    }

    pub fn has_command(&self) -> bool {
        !self.rx.is_empty()
    }

    pub fn pop(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer side of a [`CommandQueue`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<String>,
}

impl CommandSender {
    /// Queue a command line. Returns `false` once the queue is gone.
    pub fn push(&self, line: impl Into<String>) -> bool {
        self.tx.send(line.into()).is_ok()
    }
}
