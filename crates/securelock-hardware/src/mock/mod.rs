//! Mock device implementations for testing and development.
//!
//! This module provides simulated peripherals that can be controlled
//! programmatically without physical hardware. The reader chip simulator
//! lives in `securelock-rfid` because it speaks the chip's register protocol.

pub mod actuator;
pub mod button;
pub mod keypad;

// Re-export commonly used types
pub use actuator::{LineChange, MockActuator, MockActuatorHandle, MockLine};
pub use button::{MockButton, MockButtonHandle};
pub use keypad::{MockKeypad, MockKeypadHandle};
