//! Mock lock actuator that records every line change.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::time::Instant;

use crate::{HardwareError, Result, traits::LockActuator};

/// Output level of the mock relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockLine {
    Asserted,
    Deasserted,
}

/// One recorded transition of the relay line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineChange {
    pub line: MockLine,
    pub at: Instant,
}

#[derive(Debug)]
struct ActuatorState {
    line: MockLine,
    changes: Vec<LineChange>,
    fail_next_assert: bool,
}

fn lock(state: &Mutex<ActuatorState>) -> MutexGuard<'_, ActuatorState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lock actuator for tests and the emulator.
///
/// # Examples
///
/// ```
/// use securelock_hardware::mock::{MockActuator, MockLine};
/// use securelock_hardware::traits::LockActuator;
///
/// let (mut relay, handle) = MockActuator::new();
/// relay.assert().unwrap();
/// assert_eq!(handle.line(), MockLine::Asserted);
/// relay.deassert().unwrap();
/// assert_eq!(handle.changes().len(), 2);
/// ```
#[derive(Debug)]
pub struct MockActuator {
    state: Arc<Mutex<ActuatorState>>,
}

impl MockActuator {
    pub fn new() -> (Self, MockActuatorHandle) {
        let state = Arc::new(Mutex::new(ActuatorState {
            line: MockLine::Deasserted,
            changes: Vec::new(),
            fail_next_assert: false,
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockActuatorHandle { state },
        )
    }

    fn record(&self, line: MockLine) {
        let mut state = lock(&self.state);
        state.line = line;
        state.changes.push(LineChange {
            line,
            at: Instant::now(),
        });
    }
}

impl LockActuator for MockActuator {
    fn assert(&mut self) -> Result<()> {
        {
            let mut state = lock(&self.state);
            if state.fail_next_assert {
                state.fail_next_assert = false;
                return Err(HardwareError::line_control("mock relay"));
            }
        }
        self.record(MockLine::Asserted);
        Ok(())
    }

    fn deassert(&mut self) -> Result<()> {
        self.record(MockLine::Deasserted);
        Ok(())
    }
}

/// Inspection handle for a [`MockActuator`].
#[derive(Debug, Clone)]
pub struct MockActuatorHandle {
    state: Arc<Mutex<ActuatorState>>,
}

impl MockActuatorHandle {
    /// Current relay level.
    pub fn line(&self) -> MockLine {
        lock(&self.state).line
    }

    /// Every line change so far, oldest first.
    pub fn changes(&self) -> Vec<LineChange> {
        lock(&self.state).changes.clone()
    }

    pub fn assert_count(&self) -> usize {
        self.count(MockLine::Asserted)
    }

    pub fn deassert_count(&self) -> usize {
        self.count(MockLine::Deasserted)
    }

    /// Make the next `assert` fail without touching the line.
    pub fn fail_next_assert(&self) {
        lock(&self.state).fail_next_assert = true;
    }

    fn count(&self, line: MockLine) -> usize {
        lock(&self.state)
            .changes
            .iter()
            .filter(|change| change.line == line)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_changes_are_timestamped() {
        let (mut relay, handle) = MockActuator::new();

        relay.assert().unwrap();
        tokio::time::sleep(Duration::from_millis(3000)).await;
        relay.deassert().unwrap();

        let changes = handle.changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].line, MockLine::Asserted);
        assert_eq!(changes[1].line, MockLine::Deasserted);
        assert_eq!(changes[1].at - changes[0].at, Duration::from_millis(3000));
    }

    #[test]
    fn test_fail_next_assert_is_one_shot() {
        let (mut relay, handle) = MockActuator::new();
        handle.fail_next_assert();
        assert!(relay.assert().is_err());
        assert_eq!(handle.line(), MockLine::Deasserted);
        assert!(relay.assert().is_ok());
        assert_eq!(handle.assert_count(), 1);
    }
}
