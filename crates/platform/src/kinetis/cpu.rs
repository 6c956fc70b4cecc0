//! CPU-dependent initialisation backend.

use core::convert::Infallible;

use tock_registers::interfaces::ReadWriteable;

use super::gpio::enable_port_clock;
use super::regs::{block, RtcRegisters, SimRegisters, RTC_BASE, RTC_CR, SCGC6, SIM_BASE};
use crate::gpio::Port;
use crate::power::CoreInit;

/// RTC oscillator start and peripheral clock gating.
pub struct KinetisCore {
    sim: &'static SimRegisters,
    rtc: &'static RtcRegisters,
}

impl KinetisCore {
    /// Bind to the SIM and RTC blocks.
    ///
    /// # Safety
    ///
    /// Must run on a K60 and be the only owner of the RTC.
    pub unsafe fn new() -> Self {
        Self {
            // SAFETY: fixed K60 address; only clock gates are modified, read-modify-write.
            sim: unsafe { block(SIM_BASE) },
            // SAFETY: fixed K60 address; exclusivity is the caller's contract.
            rtc: unsafe { block(RTC_BASE) },
        }
    }
}

impl CoreInit for KinetisCore {
    type Error = Infallible;

    fn start_reference_oscillator(&mut self) -> Result<(), Self::Error> {
        self.sim.scgc6.modify(SCGC6::RTC::SET);
        self.rtc.cr.modify(RTC_CR::OSCE::SET);
        Ok(())
    }

    fn init_core(&mut self) -> Result<(), Self::Error> {
        for port in [Port::A, Port::B, Port::C, Port::D, Port::E] {
            enable_port_clock(self.sim, port);
        }
        #[cfg(feature = "hardware")]
        {
            cortex_m::asm::dsb();
            cortex_m::asm::isb();
        }
        Ok(())
    }
}
