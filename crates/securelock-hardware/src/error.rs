//! Error types for hardware operations.
//!
//! These cover bus-level failures of the reader transport and failures of
//! the simple digital peripherals (keypad, actuator, button). Protocol-level
//! failures of the reader chip live in `securelock-rfid`.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Bus-level fault on the serial link to a peripheral.
    #[error("Bus fault: {message}")]
    BusFault { message: String },

    /// A control line (chip select, reset, relay) could not be driven.
    #[error("Line control failed: {line}")]
    LineControl { line: String },

    /// Invalid data received from or sent to a device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new bus fault error.
    pub fn bus_fault(message: impl Into<String>) -> Self {
        Self::BusFault {
            message: message.into(),
        }
    }

    /// Create a new line control error.
    pub fn line_control(line: impl Into<String>) -> Self {
        Self::LineControl { line: line.into() }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("keypad");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: keypad");
    }

    #[test]
    fn test_bus_fault_error() {
        let error = HardwareError::bus_fault("SPI overrun");
        assert!(matches!(error, HardwareError::BusFault { .. }));
        assert_eq!(error.to_string(), "Bus fault: SPI overrun");
    }

    #[test]
    fn test_line_control_error() {
        let error = HardwareError::line_control("relay");
        assert_eq!(error.to_string(), "Line control failed: relay");
    }
}
