//! In-memory telemetry sink.
//!
//! Records every line sent and serves commands pushed through its handle.
//! Failures and stalls can be injected to exercise the controller's
//! best-effort handling.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Result, TelemetryError};
use crate::sink::{CommandQueue, CommandSender, TelemetrySink};

#[derive(Debug, Default)]
struct RecordingState {
    lines: Vec<String>,
    failing: bool,
    stalled: bool,
    attempts: usize,
}

fn lock(state: &Mutex<RecordingState>) -> MutexGuard<'_, RecordingState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Telemetry sink that keeps lines in memory.
///
/// # Examples
///
/// ```
/// use securelock_network::{RecordingTelemetry, TelemetrySink};
///
/// #[tokio::main]
/// async fn main() {
///     let (mut sink, handle) = RecordingTelemetry::new();
///
///     sink.send_log("System: System initialized").await.unwrap();
///     assert_eq!(handle.lines(), vec!["System: System initialized"]);
///
///     handle.push_command("UNLOCK");
///     assert!(sink.has_command());
///     assert_eq!(sink.get_command().as_deref(), Some("UNLOCK"));
/// }
/// ```
#[derive(Debug)]
pub struct RecordingTelemetry {
    state: Arc<Mutex<RecordingState>>,
    commands: CommandQueue,
}

impl RecordingTelemetry {
    pub fn new() -> (Self, RecordingTelemetryHandle) {
        let state = Arc::new(Mutex::new(RecordingState::default()));
        let commands = CommandQueue::new();
        let handle = RecordingTelemetryHandle {
            state: Arc::clone(&state),
            commands: commands.sender(),
        };
        (Self { state, commands }, handle)
    }
}

impl TelemetrySink for RecordingTelemetry {
    async fn send_log(&mut self, line: &str) -> Result<()> {
        let (failing, stalled) = {
            let mut state = lock(&self.state);
            state.attempts += 1;
            (state.failing, state.stalled)
        };
        if stalled {
            std::future::pending::<()>().await;
        }
        if failing {
            return Err(TelemetryError::ConnectionLost("injected failure".into()));
        }
        lock(&self.state).lines.push(line.to_owned());
        Ok(())
    }

    fn has_command(&self) -> bool {
        self.commands.has_command()
    }

    fn get_command(&mut self) -> Option<String> {
        self.commands.pop()
    }
}

/// Inspects and steers a [`RecordingTelemetry`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RecordingTelemetryHandle {
    state: Arc<Mutex<RecordingState>>,
    commands: CommandSender,
}

impl RecordingTelemetryHandle {
    /// Lines accepted so far, oldest first.
    pub fn lines(&self) -> Vec<String> {
        lock(&self.state).lines.clone()
    }

    /// Every `send_log` call, including failed and stalled ones.
    pub fn attempts(&self) -> usize {
        lock(&self.state).attempts
    }

    pub fn clear(&self) {
        lock(&self.state).lines.clear();
    }

    /// Reject every line until cleared.
    pub fn set_failing(&self, failing: bool) {
        lock(&self.state).failing = failing;
    }

    /// Never complete `send_log` until cleared.
    pub fn set_stalled(&self, stalled: bool) {
        lock(&self.state).stalled = stalled;
    }

    /// Queue an administrative command line.
    pub fn push_command(&self, line: impl Into<String>) -> bool {
        self.commands.push(line)
    }
}
