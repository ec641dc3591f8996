//! PIN assembly on top of a [`KeypadDevice`].

use std::time::Duration;

use tokio::time::{Instant, timeout_at};
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::Result;
use crate::traits::{KeypadDevice, KeypadInput, PinInput};

/// Beep length acknowledging a digit.
const KEY_FEEDBACK_MS: u16 = 50;

/// Turns raw key presses into a PIN.
///
/// Digits append (ignored once `max_len` is reached), `Clear`/`*` erase the
/// last digit, `Enter`/`#` submit, letter keys are ignored. An empty
/// submission is ignored and entry continues. The whole entry, not each key,
/// is bounded by the timeout.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use securelock_hardware::keypad::KeypadPinReader;
/// use securelock_hardware::mock::MockKeypad;
/// use securelock_hardware::traits::PinInput;
///
/// #[tokio::main]
/// async fn main() -> securelock_hardware::Result<()> {
///     let (keypad, handle) = MockKeypad::new();
///     let mut reader = KeypadPinReader::new(keypad);
///
///     handle.type_keys("125*34#").await?;
///
///     let pin = reader.read_pin(6, Duration::from_secs(5)).await?;
///     assert_eq!(pin.as_deref().map(String::as_str), Some("1234"));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct KeypadPinReader<K> {
    keypad: K,
}

impl<K: KeypadDevice> KeypadPinReader<K> {
    pub fn new(keypad: K) -> Self {
        Self { keypad }
    }

    pub fn keypad(&self) -> &K {
        &self.keypad
    }

    pub fn into_inner(self) -> K {
        self.keypad
    }
}

impl<K: KeypadDevice> PinInput for KeypadPinReader<K> {
    async fn read_pin(
        &mut self,
        max_len: usize,
        timeout: Duration,
    ) -> Result<Option<Zeroizing<String>>> {
        let deadline = Instant::now() + timeout;
        let mut pin = Zeroizing::new(String::with_capacity(max_len));

        loop {
            let input = match timeout_at(deadline, self.keypad.read_input()).await {
                Ok(input) => input?,
                Err(_) => {
                    debug!(typed = pin.len(), "PIN entry timed out");
                    return Ok(None);
                }
            };

            match input {
                KeypadInput::Digit(d) => {
                    if pin.len() < max_len {
                        pin.push(char::from(b'0' + d));
                        self.keypad.beep(KEY_FEEDBACK_MS).await.ok();
                    } else {
                        trace!("digit ignored, PIN already at maximum length");
                    }
                }
                key if key.is_submit() => {
                    if pin.is_empty() {
                        trace!("empty PIN submission ignored");
                        continue;
                    }
                    return Ok(Some(pin));
                }
                key if key.is_erase() => {
                    pin.pop();
                }
                _ => {}
            }
        }
    }
}
