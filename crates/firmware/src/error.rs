//! Bring-up error type.
//!
//! Nothing in the boot sequence fails on its own: production backends are
//! infallible and the radio loop waits as long as it takes. This enum exists
//! so HAL driver errors propagate with `?` instead of being swallowed, and so
//! the bounded radio mode used by tests can report that it gave up.

use embedded_hal::spi::ErrorKind;
use platform::{DeviceId, Line};
use thiserror_no_std::Error;

/// Failure while bringing the board up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BringupError {
    /// The GPIO driver rejected an operation on `line`.
    #[error("GPIO driver rejected an operation on {line}")]
    Gpio {
        /// Line being configured or driven.
        line: Line,
    },
    /// The SPI master could not be initialised.
    #[error("SPI master initialisation failed: {kind}")]
    SpiInit {
        /// Driver error class.
        kind: ErrorKind,
    },
    /// A transaction with `device` failed on the bus.
    #[error("SPI transaction with {device:?} failed: {kind}")]
    Spi {
        /// Device whose chip select was asserted.
        device: DeviceId,
        /// Driver error class.
        kind: ErrorKind,
    },
    /// CPU-dependent initialisation failed.
    #[error("core initialisation failed")]
    Core,
    /// The low-power subsystem could not be initialised.
    #[error("low-power initialisation failed")]
    LowPower,
    /// Bounded radio convergence ran out of attempts (test instrumentation only).
    #[error("radio still reported status {last_status:#04x} after {attempts} reads")]
    RadioNotSettled {
        /// Status byte returned by the last read.
        last_status: u8,
        /// Status reads performed.
        attempts: u32,
    },
}

/// Convenience alias used throughout the boot sequence.
pub type Result<T, E = BringupError> = core::result::Result<T, E>;

/// Attach the failing line to a GPIO driver error.
pub(crate) trait OnLine<T> {
    fn on_line(self, line: Line) -> Result<T>;
}

impl<T, E> OnLine<T> for core::result::Result<T, E> {
    fn on_line(self, line: Line) -> Result<T> {
        self.map_err(|_| BringupError::Gpio { line })
    }
}
