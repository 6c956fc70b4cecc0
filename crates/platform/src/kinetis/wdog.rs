//! Watchdog disable, run before RAM initialisation.

use tock_registers::interfaces::Writeable;

use super::regs::{block, WdogRegisters, WDOG_BASE};

const UNLOCK_KEY1: u16 = 0xC520;
const UNLOCK_KEY2: u16 = 0xD928;
/// `STCTRLH` with `WDOGEN` clear and `ALLOWUPDATE` set.
const STCTRLH_DISABLED: u16 = 0x01D2;

/// Disable the COP watchdog.
///
/// The unlock window is 20 bus cycles; the configuration write must follow
/// the two key writes with nothing in between.
///
/// # Safety
///
/// Must run on a K60 with interrupts disabled, before anything else touches
/// the watchdog.
pub unsafe fn disable_watchdog() {
    // SAFETY: fixed K60 address; caller guarantees exclusive early-boot access.
    let wdog: &WdogRegisters = unsafe { block(WDOG_BASE) };
    wdog.unlock.set(UNLOCK_KEY1);
    wdog.unlock.set(UNLOCK_KEY2);
    #[cfg(feature = "hardware")]
    {
        cortex_m::asm::nop();
        cortex_m::asm::nop();
    }
    wdog.stctrlh.set(STCTRLH_DISABLED);
}
