//! Kinetis K60 memory-mapped backends.
//!
//! Each type binds to fixed peripheral addresses in an `unsafe fn new()`;
//! only the hardware entry point constructs them. Host tests use
//! `crate::mocks` instead.

mod clock;
mod cpu;
mod gpio;
mod lpm;
mod regs;
mod spi;
mod wdog;

pub use self::clock::KinetisClockRegisters;
pub use self::cpu::KinetisCore;
pub use self::gpio::KinetisGpio;
pub use self::lpm::KinetisLowPower;
pub use self::spi::{baud_divisors, BaudDivisors, KinetisSpi};
pub use self::wdog::disable_watchdog;
