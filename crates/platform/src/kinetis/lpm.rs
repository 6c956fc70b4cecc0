//! Low-power mode initialisation backend.

use core::convert::Infallible;

use tock_registers::interfaces::Writeable;

use super::regs::{block, SmcRegisters, SMC_BASE};
use crate::power::{pmprot_value, LowPowerInit, StopMode};

/// Unlocks VLP, LLS and VLLS in `SMC_PMPROT`.
pub struct KinetisLowPower {
    smc: &'static SmcRegisters,
}

impl KinetisLowPower {
    /// Bind to the SMC block.
    ///
    /// # Safety
    ///
    /// Must run on a K60. `SMC_PMPROT` is write-once after reset; nothing
    /// else may write it.
    pub unsafe fn new() -> Self {
        Self {
            // SAFETY: fixed K60 address; exclusivity is the caller's contract.
            smc: unsafe { block(SMC_BASE) },
        }
    }
}

impl LowPowerInit for KinetisLowPower {
    type Error = Infallible;

    fn init_low_power(&mut self) -> Result<(), Self::Error> {
        self.smc.pmprot.set(pmprot_value(&StopMode::ALL));
        Ok(())
    }
}
