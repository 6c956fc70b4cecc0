//! Mulle firmware entry point.
//!
//! Hardware-only: disables the watchdog before RAM init, brings the board up
//! and idles in `wfi` until an application takes over.

#![no_std]
#![no_main]

use cortex_m_rt::{entry, pre_init};
use defmt_rtt as _;
use firmware::boot::{Board, Bringup};
use firmware::BringupConfig;
use platform::delay::BusyLoop;
use platform::kinetis::{KinetisClockRegisters, KinetisCore, KinetisGpio, KinetisLowPower, KinetisSpi};

// Panic handler
use panic_probe as _;

/// Kinetis flash configuration field (0x400..0x410): backdoor key, FPROT,
/// FSEC = 0xFE (unsecured), FOPT, FEPROT, FDPROT.
#[link_section = ".flash_config"]
#[no_mangle]
#[used]
static FLASH_CONFIG: [u8; 16] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, // backdoor key
    0xFF, 0xFF, 0xFF, 0xFF, // FPROT
    0xFE, // FSEC
    0xFF, // FOPT
    0xFF, // FEPROT
    0xFF, // FDPROT
];

#[pre_init]
unsafe fn disable_watchdog() {
    // SAFETY: runs once before RAM init with interrupts disabled; the WDOG
    // unlock window only needs the two key writes back to back.
    unsafe { platform::kinetis::disable_watchdog() };
}

#[entry]
fn main() -> ! {
    defmt::info!("Mulle bring-up, K60 rev {=u8}", platform::CPU_REVISION);

    // SAFETY: sole owner of SIM, MCG, PORT, GPIO, DSPI0, RTC and SMC from
    // here on; nothing else in this binary touches them.
    let mut board = unsafe {
        Board {
            registers: KinetisClockRegisters::new(),
            gpio: KinetisGpio::new(),
            spi: KinetisSpi::new(),
            delay: BusyLoop,
            core: KinetisCore::new(),
            low_power: KinetisLowPower::new(),
        }
    };

    match Bringup::new(BringupConfig::mulle()).run(&mut board) {
        Ok(done) => defmt::info!("bring-up complete: {}", done.report()),
        Err(err) => defmt::error!("bring-up failed: {}", defmt::Display2Format(&err)),
    }

    loop {
        cortex_m::asm::wfi();
    }
}
