//! PORT/GPIO backend.

use core::convert::Infallible;

use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};

use super::regs::{
    block, gpio_base, port_base, GpioRegisters, PortRegisters, SimRegisters, PCR, SCGC5, SIM_BASE,
};
use crate::gpio::{GpioDriver, Line, Port, Pull};

/// GPIO driver over PORTA..PORTE.
pub struct KinetisGpio {
    sim: &'static SimRegisters,
}

fn port_block(port: Port) -> &'static PortRegisters {
    // SAFETY: every PORTx_BASE is a fixed K60 PORT block address.
    unsafe { block(port_base(port)) }
}

fn gpio_block(port: Port) -> &'static GpioRegisters {
    // SAFETY: every PTx_BASE is a fixed K60 GPIO block address.
    unsafe { block(gpio_base(port)) }
}

/// Route `line` to pin-mux alternative `mux` with its clock gate enabled.
pub(crate) fn set_pin_mux(sim: &SimRegisters, line: Line, mux: u32) {
    enable_port_clock(sim, line.port);
    if let Some(pcr) = port_block(line.port).pcr.get(usize::from(line.pin)) {
        pcr.modify(PCR::MUX.val(mux));
    }
}

pub(crate) fn enable_port_clock(sim: &SimRegisters, port: Port) {
    let gate = match port {
        Port::A => SCGC5::PORTA::SET,
        Port::B => SCGC5::PORTB::SET,
        Port::C => SCGC5::PORTC::SET,
        Port::D => SCGC5::PORTD::SET,
        Port::E => SCGC5::PORTE::SET,
    };
    sim.scgc5.modify(gate);
}

impl KinetisGpio {
    /// Bind to the PORT and GPIO blocks.
    ///
    /// # Safety
    ///
    /// Must run on a K60. Lines handed to this driver must not be driven by
    /// any other code.
    pub unsafe fn new() -> Self {
        Self {
            // SAFETY: fixed K60 address; only SCGC5 is modified, read-modify-write.
            sim: unsafe { block(SIM_BASE) },
        }
    }
}

impl GpioDriver for KinetisGpio {
    type Error = Infallible;

    fn init_output(&mut self, line: Line, pull: Pull) -> Result<(), Self::Error> {
        enable_port_clock(self.sim, line.port);
        if let Some(pcr) = port_block(line.port).pcr.get(usize::from(line.pin)) {
            let pull = match pull {
                Pull::None => PCR::PE::CLEAR,
                Pull::Up => PCR::PE::SET + PCR::PS::PullUp,
                Pull::Down => PCR::PE::SET + PCR::PS::PullDown,
            };
            pcr.write(PCR::MUX::Gpio + pull);
        }
        let gpio = gpio_block(line.port);
        gpio.pddr.set(gpio.pddr.get() | line.mask());
        Ok(())
    }

    fn set(&mut self, line: Line) -> Result<(), Self::Error> {
        gpio_block(line.port).psor.set(line.mask());
        Ok(())
    }

    fn clear(&mut self, line: Line) -> Result<(), Self::Error> {
        gpio_block(line.port).pcor.set(line.mask());
        Ok(())
    }
}
