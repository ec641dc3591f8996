//! Scoped ownership of control lines.
//!
//! Both guards release their line in `Drop`, so an early `?` return, a
//! panic unwinding through the caller, or a cancelled future cannot leave
//! the bus selected or the lock energized.

use tracing::error;

use crate::error::Result;
use crate::traits::{LockActuator, ReaderTransport};

/// Chip select held for the lifetime of the guard.
///
/// # Examples
///
/// ```no_run
/// use securelock_hardware::guard::ChipSelect;
/// use securelock_hardware::traits::ReaderTransport;
///
/// async fn read_version<T: ReaderTransport>(bus: &mut T) -> securelock_hardware::Result<u8> {
///     let mut cs = ChipSelect::acquire(bus)?;
///     cs.exchange(0x80 | (0x37 << 1)).await?;
///     cs.exchange(0x00).await
///     // chip select released here, also on the error path above
/// }
/// ```
pub struct ChipSelect<'a, T: ReaderTransport> {
    transport: &'a mut T,
}

impl<'a, T: ReaderTransport> ChipSelect<'a, T> {
    /// Assert chip select.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the line could not be driven; nothing
    /// is held in that case.
    pub fn acquire(transport: &'a mut T) -> Result<Self> {
        transport.select()?;
        Ok(Self { transport })
    }

    /// Exchange one byte while selected.
    pub async fn exchange(&mut self, byte: u8) -> Result<u8> {
        self.transport.exchange_byte(byte).await
    }
}

impl<T: ReaderTransport> Drop for ChipSelect<'_, T> {
    fn drop(&mut self) {
        self.transport.deselect();
    }
}

/// Lock release held open for the lifetime of the guard.
///
/// The actuator is deasserted exactly once: either by
/// [`release`](ActuatorGuard::release) or, if the guard is dropped without
/// it, by `Drop`.
pub struct ActuatorGuard<'a, A: LockActuator> {
    actuator: &'a mut A,
    released: bool,
}

impl<'a, A: LockActuator> ActuatorGuard<'a, A> {
    /// Assert the actuator.
    ///
    /// # Errors
    ///
    /// Returns the actuator error if the output could not be driven. The
    /// actuator is deasserted before returning so a half-driven relay is
    /// not left energized.
    pub fn engage(actuator: &'a mut A) -> Result<Self> {
        if let Err(e) = actuator.assert() {
            if let Err(release_err) = actuator.deassert() {
                error!(error = %release_err, "failed to deassert actuator after assert failure");
            }
            return Err(e);
        }
        Ok(Self {
            actuator,
            released: false,
        })
    }

    /// Deassert now and report the outcome.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.actuator.deassert()
    }
}

impl<A: LockActuator> Drop for ActuatorGuard<'_, A> {
    fn drop(&mut self) {
        if !self.released {
            self.released = true;
            if let Err(e) = self.actuator.deassert() {
                error!(error = %e, "failed to deassert lock actuator");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockActuator, MockLine};
    use crate::HardwareError;

    struct CountingBus {
        selects: u32,
        deselects: u32,
        fail_exchange: bool,
    }

    impl ReaderTransport for CountingBus {
        async fn exchange_byte(&mut self, byte: u8) -> Result<u8> {
            if self.fail_exchange {
                return Err(HardwareError::bus_fault("injected"));
            }
            Ok(byte)
        }

        fn select(&mut self) -> Result<()> {
            self.selects += 1;
            Ok(())
        }

        fn deselect(&mut self) {
            self.deselects += 1;
        }

        fn set_reset_line(&mut self, _asserted: bool) -> Result<()> {
            Ok(())
        }
    }

    async fn two_byte_transaction(bus: &mut CountingBus) -> Result<u8> {
        let mut cs = ChipSelect::acquire(bus)?;
        cs.exchange(0x02).await?;
        cs.exchange(0x00).await
    }

    #[tokio::test]
    async fn test_chip_select_released_on_success() {
        let mut bus = CountingBus {
            selects: 0,
            deselects: 0,
            fail_exchange: false,
        };
        assert!(two_byte_transaction(&mut bus).await.is_ok());
        assert_eq!((bus.selects, bus.deselects), (1, 1));
    }

    #[tokio::test]
    async fn test_chip_select_released_on_error() {
        let mut bus = CountingBus {
            selects: 0,
            deselects: 0,
            fail_exchange: true,
        };
        assert!(two_byte_transaction(&mut bus).await.is_err());
        assert_eq!((bus.selects, bus.deselects), (1, 1));
    }

    #[test]
    fn test_actuator_released_once_on_drop() {
        let (mut actuator, handle) = MockActuator::new();
        {
            let _guard = ActuatorGuard::engage(&mut actuator).unwrap();
            assert_eq!(handle.line(), MockLine::Asserted);
        }
        assert_eq!(handle.line(), MockLine::Deasserted);
        assert_eq!(handle.assert_count(), 1);
        assert_eq!(handle.deassert_count(), 1);
    }

    #[test]
    fn test_actuator_explicit_release_not_repeated() {
        let (mut actuator, handle) = MockActuator::new();
        let guard = ActuatorGuard::engage(&mut actuator).unwrap();
        guard.release().unwrap();
        assert_eq!(handle.deassert_count(), 1);
    }

    #[test]
    fn test_actuator_engage_failure_leaves_line_low() {
        let (mut actuator, handle) = MockActuator::new();
        handle.fail_next_assert();
        assert!(ActuatorGuard::engage(&mut actuator).is_err());
        assert_eq!(handle.line(), MockLine::Deasserted);
    }
}
