//! Mock keypad implementation for testing and development.
//!
//! Key presses are pushed through a [`MockKeypadHandle`] and come out of
//! [`KeypadDevice::read_input`] in order, as if the matrix scanner had
//! debounced them.

use tokio::sync::mpsc;

use crate::{
    HardwareError, Result,
    traits::{KeypadDevice, KeypadInput},
};

/// Mock keypad device.
///
/// # Examples
///
/// ```
/// use securelock_hardware::mock::MockKeypad;
/// use securelock_hardware::traits::{KeypadDevice, KeypadInput};
///
/// #[tokio::main]
/// async fn main() -> securelock_hardware::Result<()> {
///     let (mut keypad, handle) = MockKeypad::new();
///
///     handle.type_keys("12#").await?;
///
///     assert_eq!(keypad.read_input().await?, KeypadInput::Digit(1));
///     assert_eq!(keypad.read_input().await?, KeypadInput::Digit(2));
///     assert_eq!(keypad.read_input().await?, KeypadInput::Hash);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockKeypad {
    input_rx: mpsc::Receiver<KeypadInput>,

    /// Number of acknowledgement beeps requested so far.
    beeps: usize,
}

impl MockKeypad {
    /// Create a new mock keypad and the handle that feeds it.
    pub fn new() -> (Self, MockKeypadHandle) {
        let (input_tx, input_rx) = mpsc::channel(64);
        (Self { input_rx, beeps: 0 }, MockKeypadHandle { input_tx })
    }

    /// Beeps requested by the consumer.
    pub fn beeps(&self) -> usize {
        self.beeps
    }
}

impl KeypadDevice for MockKeypad {
    async fn read_input(&mut self) -> Result<KeypadInput> {
        self.input_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected("Keypad input channel closed"))
    }

    async fn beep(&mut self, _duration_ms: u16) -> Result<()> {
        self.beeps += 1;
        Ok(())
    }
}

/// Handle for controlling a mock keypad. Cheap to clone.
#[derive(Debug, Clone)]
pub struct MockKeypadHandle {
    input_tx: mpsc::Sender<KeypadInput>,
}

impl MockKeypadHandle {
    /// Send one key press.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad has been dropped.
    pub async fn send_input(&self, input: KeypadInput) -> Result<()> {
        self.input_tx
            .send(input)
            .await
            .map_err(|_| HardwareError::disconnected("Keypad input channel closed"))
    }

    /// Send each key cap in `keys` (`0-9 * # A-D`).
    ///
    /// # Errors
    ///
    /// Returns an error on an unknown key cap or a dropped keypad. Keys
    /// before the offending one have already been sent.
    pub async fn type_keys(&self, keys: &str) -> Result<()> {
        for key in keys.chars().filter(|c| !c.is_whitespace()) {
            self.send_input(KeypadInput::from_key(key)?).await?;
        }
        Ok(())
    }

    /// Type `pin` followed by Enter.
    ///
    /// # Errors
    ///
    /// Same as [`type_keys`](Self::type_keys).
    pub async fn enter_pin(&self, pin: &str) -> Result<()> {
        self.type_keys(pin).await?;
        self.send_input(KeypadInput::Enter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_keypad_sequence() {
        let (mut keypad, handle) = MockKeypad::new();

        tokio::spawn(async move {
            handle.enter_pin("98").await.unwrap();
        });

        assert_eq!(keypad.read_input().await.unwrap(), KeypadInput::Digit(9));
        assert_eq!(keypad.read_input().await.unwrap(), KeypadInput::Digit(8));
        assert_eq!(keypad.read_input().await.unwrap(), KeypadInput::Enter);
    }

    #[tokio::test]
    async fn test_mock_keypad_rejects_unknown_key() {
        let (_keypad, handle) = MockKeypad::new();
        assert!(handle.type_keys("12x").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_keypad_beep_counted() {
        let (mut keypad, _handle) = MockKeypad::new();
        keypad.beep(50).await.unwrap();
        keypad.beep(50).await.unwrap();
        assert_eq!(keypad.beeps(), 2);
    }

    #[tokio::test]
    async fn test_mock_keypad_closed_channel() {
        let (mut keypad, handle) = MockKeypad::new();
        drop(handle);
        assert!(keypad.read_input().await.is_err());
    }
}
