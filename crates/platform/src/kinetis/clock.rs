//! Memory-mapped [`RegisterFile`] over the SIM and MCG blocks.

use tock_registers::interfaces::{Readable, Writeable};

use super::regs::{block, McgRegisters, SimRegisters, MCG_BASE, SIM_BASE};
use crate::registers::{Register, RegisterFile};

/// Live SIM/MCG registers.
pub struct KinetisClockRegisters {
    sim: &'static SimRegisters,
    mcg: &'static McgRegisters,
}

impl KinetisClockRegisters {
    /// Bind to the SIM and MCG blocks.
    ///
    /// # Safety
    ///
    /// Must run on a K60 and be the only owner of the SIM clock registers and
    /// the MCG for as long as the value lives.
    pub unsafe fn new() -> Self {
        Self {
            // SAFETY: fixed K60 addresses; exclusivity is the caller's contract.
            sim: unsafe { block(SIM_BASE) },
            // SAFETY: as above.
            mcg: unsafe { block(MCG_BASE) },
        }
    }
}

impl RegisterFile for KinetisClockRegisters {
    fn read(&mut self, register: Register) -> u32 {
        match register {
            Register::SimSopt1 => self.sim.sopt1.get(),
            Register::SimSopt2 => self.sim.sopt2.get(),
            Register::SimClkdiv1 => self.sim.clkdiv1.get(),
            Register::McgC1 => u32::from(self.mcg.c1.get()),
            Register::McgC2 => u32::from(self.mcg.c2.get()),
            Register::McgC4 => u32::from(self.mcg.c4.get()),
            Register::McgC6 => u32::from(self.mcg.c6.get()),
            Register::McgS => u32::from(self.mcg.s.get()),
            Register::McgC7 => u32::from(self.mcg.c7.get()),
        }
    }

    /// MCG registers take the low byte. `MCG_S` is read-only; writes to it
    /// are dropped.
    #[allow(clippy::cast_possible_truncation)]
    fn write(&mut self, register: Register, value: u32) {
        match register {
            Register::SimSopt1 => self.sim.sopt1.set(value),
            Register::SimSopt2 => self.sim.sopt2.set(value),
            Register::SimClkdiv1 => self.sim.clkdiv1.set(value),
            Register::McgC1 => self.mcg.c1.set(value as u8),
            Register::McgC2 => self.mcg.c2.set(value as u8),
            Register::McgC4 => self.mcg.c4.set(value as u8),
            Register::McgC6 => self.mcg.c6.set(value as u8),
            Register::McgS => {}
            Register::McgC7 => self.mcg.c7.set(value as u8),
        }
    }
}
