//! Hardware device trait definitions.
//!
//! These traits are the contract between the access controller and the
//! peripherals it drives: the reader chip's serial bus, the numeric keypad,
//! the lock relay and the maintenance button.
//!
//! Bus transfers and key reads are `async fn` (Rust 1.90 + Edition 2024
//! RPITIT). Line control (chip select, reset line, relay, button) is plain
//! synchronous GPIO and stays synchronous so it can be released from `Drop`.

#![allow(async_fn_in_trait)]

use std::time::Duration;

use zeroize::Zeroizing;

use crate::error::{HardwareError, Result};

/// Time the reset line is held low.
pub const RESET_SETTLE: Duration = Duration::from_millis(10);

/// Time the chip needs after reset is released before it accepts commands.
pub const RESET_POWER_UP: Duration = Duration::from_millis(10);

/// Input from a keypad device.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KeypadInput {
    /// Numeric digit (0-9).
    Digit(u8),

    /// Star key (*), wired as backspace on 4x4 matrix keypads.
    Star,

    /// Hash/pound key (#), wired as enter on 4x4 matrix keypads.
    Hash,

    /// Enter/confirm key.
    Enter,

    /// Clear input key (removes the last digit).
    Clear,

    /// Letter function key (A-D on a 4x4 matrix).
    Function(char),
}

impl KeypadInput {
    /// Create a digit input.
    ///
    /// # Errors
    ///
    /// Returns an error if the digit is greater than 9.
    ///
    /// # Examples
    ///
    /// ```
    /// use securelock_hardware::traits::KeypadInput;
    ///
    /// let input = KeypadInput::digit(5).unwrap();
    /// assert_eq!(input.as_digit(), Some(5));
    ///
    /// assert!(KeypadInput::digit(10).is_err());
    /// ```
    pub fn digit(d: u8) -> Result<Self> {
        if d > 9 {
            return Err(HardwareError::invalid_data(format!(
                "Digit must be 0-9, got {}",
                d
            )));
        }
        Ok(Self::Digit(d))
    }

    /// Map a key cap of a 4x4 matrix keypad (`0-9 * # A-D`).
    ///
    /// # Errors
    ///
    /// Returns an error for any other character.
    pub fn from_key(key: char) -> Result<Self> {
        match key {
            '0'..='9' => Ok(Self::Digit(key as u8 - b'0')),
            '*' => Ok(Self::Star),
            '#' => Ok(Self::Hash),
            'A'..='D' | 'a'..='d' => Ok(Self::Function(key.to_ascii_uppercase())),
            other => Err(HardwareError::invalid_data(format!(
                "Unknown key '{}'",
                other
            ))),
        }
    }

    /// Get the digit value if this is a digit input.
    pub fn as_digit(&self) -> Option<u8> {
        match self {
            Self::Digit(d) => Some(*d),
            _ => None,
        }
    }

    /// Keys that submit the PIN typed so far.
    pub fn is_submit(&self) -> bool {
        matches!(self, Self::Enter | Self::Hash)
    }

    /// Keys that erase the last typed digit.
    pub fn is_erase(&self) -> bool {
        matches!(self, Self::Clear | Self::Star)
    }
}

/// Keypad device abstraction.
///
/// Scanning and debouncing happen below this trait; `read_input` yields one
/// debounced key press at a time.
pub trait KeypadDevice: Send {
    /// Read the next key press.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is disconnected or a communication
    /// error occurs.
    async fn read_input(&mut self) -> Result<KeypadInput>;

    /// Short audible or visual acknowledgement of a key press.
    async fn beep(&mut self, duration_ms: u16) -> Result<()>;
}

/// Source of complete PIN entries.
pub trait PinInput: Send {
    /// Collect one PIN of at most `max_len` digits.
    ///
    /// Returns `Ok(None)` when no PIN was submitted before `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying input device fails.
    async fn read_pin(
        &mut self,
        max_len: usize,
        timeout: Duration,
    ) -> Result<Option<Zeroizing<String>>>;
}

/// Full-duplex byte channel to the reader chip plus its control lines.
///
/// Every register access made by the protocol engine is bracketed by
/// [`select`](ReaderTransport::select) and
/// [`deselect`](ReaderTransport::deselect); use
/// [`ChipSelect`](crate::guard::ChipSelect) rather than calling them
/// directly so the line is released on every exit path. No retries happen
/// at this layer.
pub trait ReaderTransport: Send {
    /// Shift one byte out while shifting one byte in.
    ///
    /// # Errors
    ///
    /// Returns an error only on a bus-level fault.
    async fn exchange_byte(&mut self, byte: u8) -> Result<u8>;

    /// Assert chip select.
    ///
    /// # Errors
    ///
    /// Returns an error if the line could not be driven.
    fn select(&mut self) -> Result<()>;

    /// Release chip select.
    fn deselect(&mut self);

    /// Drive the reset line (`true` holds the chip in reset).
    ///
    /// # Errors
    ///
    /// Returns an error if the line could not be driven.
    fn set_reset_line(&mut self, asserted: bool) -> Result<()>;

    /// Hardware reset: hold reset for [`RESET_SETTLE`], release it, then
    /// wait [`RESET_POWER_UP`] for the chip to come up.
    ///
    /// # Errors
    ///
    /// Propagates line control failures unchanged.
    async fn reset(&mut self) -> Result<()> {
        self.set_reset_line(true)?;
        tokio::time::sleep(RESET_SETTLE).await;
        self.set_reset_line(false)?;
        tokio::time::sleep(RESET_POWER_UP).await;
        Ok(())
    }
}

/// Lock release output. Open loop: no position feedback is read.
pub trait LockActuator: Send {
    /// Energize the release.
    ///
    /// # Errors
    ///
    /// Returns an error if the output could not be driven.
    fn assert(&mut self) -> Result<()>;

    /// De-energize the release.
    ///
    /// # Errors
    ///
    /// Returns an error if the output could not be driven.
    fn deassert(&mut self) -> Result<()>;
}

/// Momentary push button used to toggle maintenance mode.
pub trait MaintenanceButton: Send {
    /// Current level of the button.
    ///
    /// # Errors
    ///
    /// Returns an error if the input could not be read.
    fn is_pressed(&mut self) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case('0', KeypadInput::Digit(0))]
    #[case('7', KeypadInput::Digit(7))]
    #[case('*', KeypadInput::Star)]
    #[case('#', KeypadInput::Hash)]
    #[case('b', KeypadInput::Function('B'))]
    fn test_from_key(#[case] key: char, #[case] expected: KeypadInput) {
        assert_eq!(KeypadInput::from_key(key).unwrap(), expected);
    }

    #[test]
    fn test_from_key_invalid() {
        assert!(KeypadInput::from_key('x').is_err());
        assert!(KeypadInput::from_key('E').is_err());
    }

    #[test]
    fn test_submit_and_erase_keys() {
        assert!(KeypadInput::Enter.is_submit());
        assert!(KeypadInput::Hash.is_submit());
        assert!(KeypadInput::Clear.is_erase());
        assert!(KeypadInput::Star.is_erase());
        assert!(!KeypadInput::Digit(1).is_submit());
        assert!(!KeypadInput::Function('A').is_erase());
    }
}
