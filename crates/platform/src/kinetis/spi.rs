//! DSPI master backend.
//!
//! The hardware PCS outputs are unused: chip selects on the Mulle are GPIO
//! lines owned by the caller. Every frame is pushed with `CONT = 0` and read
//! back before the next one, one byte at a time.

use core::convert::Infallible;

use embedded_hal::spi::{ErrorType, SpiBus};
use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};

use super::gpio::set_pin_mux;
use super::regs::{block, DspiRegisters, SimRegisters, CTAR, MCR, PUSHR, SCGC6, SIM_BASE, SPI0_BASE, SR};
use crate::board;
use crate::clock_config::{bus_clock_hz, Hertz};
use crate::peripheral::{BitOrder, SpiConfig, SpiMaster};

/// Baud rate prescaler values selected by `CTAR.PBR`.
const PRESCALERS: [u32; 4] = [2, 3, 5, 7];
/// Baud rate scaler values selected by `CTAR.BR`.
const SCALERS: [u32; 16] = [
    2, 4, 6, 8, 16, 32, 64, 128, 256, 512, 1024, 2048, 4096, 8192, 16384, 32768,
];

/// `CTAR` divider fields for one SCK rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BaudDivisors {
    /// `CTAR.PBR` index.
    pub pbr: u8,
    /// `CTAR.BR` index.
    pub br: u8,
    /// Resulting SCK frequency.
    pub sck: Hertz,
}

/// Fastest SCK not above `target` reachable from `bus` with `DBR = 0`.
///
/// `None` when even the slowest divider overshoots `target`.
#[allow(clippy::cast_possible_truncation)] // indices are < 16
pub fn baud_divisors(bus: Hertz, target: Hertz) -> Option<BaudDivisors> {
    let mut best: Option<BaudDivisors> = None;
    for (pbr, prescaler) in PRESCALERS.iter().enumerate() {
        for (br, scaler) in SCALERS.iter().enumerate() {
            let Some(sck) = prescaler
                .checked_mul(*scaler)
                .and_then(|div| bus.0.checked_div(div))
            else {
                continue;
            };
            if sck > target.0 {
                continue;
            }
            if best.map_or(true, |b| sck > b.sck.0) {
                best = Some(BaudDivisors {
                    pbr: pbr as u8,
                    br: br as u8,
                    sck: Hertz(sck),
                });
            }
        }
    }
    best
}

/// SPI0 in master mode.
pub struct KinetisSpi {
    sim: &'static SimRegisters,
    dspi: &'static DspiRegisters,
}

impl KinetisSpi {
    /// Bind to SPI0.
    ///
    /// # Safety
    ///
    /// Must run on a K60 and be the only owner of SPI0.
    pub unsafe fn new() -> Self {
        Self {
            // SAFETY: fixed K60 address; only SCGC5/SCGC6 are modified, read-modify-write.
            sim: unsafe { block(SIM_BASE) },
            // SAFETY: fixed K60 address; exclusivity is the caller's contract.
            dspi: unsafe { block(SPI0_BASE) },
        }
    }

    fn exchange(&mut self, byte: u8) -> u8 {
        while !self.dspi.sr.is_set(SR::TFFF) {
            core::hint::spin_loop();
        }
        self.dspi
            .pushr
            .write(PUSHR::CONT::CLEAR + PUSHR::CTAS.val(0) + PUSHR::TXDATA.val(u32::from(byte)));
        self.dspi.sr.write(SR::TFFF::SET);

        while !self.dspi.sr.is_set(SR::RFDF) {
            core::hint::spin_loop();
        }
        #[allow(clippy::cast_possible_truncation)] // 8-bit frames
        let rx = self.dspi.popr.get() as u8;
        self.dspi.sr.write(SR::RFDF::SET + SR::TCF::SET);
        rx
    }
}

impl ErrorType for KinetisSpi {
    type Error = Infallible;
}

impl SpiBus<u8> for KinetisSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        for word in words {
            *word = self.exchange(0x00);
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        for &word in words {
            self.exchange(word);
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        let len = read.len().max(write.len());
        for i in 0..len {
            let rx = self.exchange(write.get(i).copied().unwrap_or(0x00));
            if let Some(slot) = read.get_mut(i) {
                *slot = rx;
            }
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        for word in words {
            *word = self.exchange(*word);
        }
        Ok(())
    }

    /// Every exchange already waits for its received frame.
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl SpiMaster for KinetisSpi {
    fn init_master(&mut self, config: &SpiConfig) -> Result<(), Self::Error> {
        for line in [board::SPI0_SCK, board::SPI0_SOUT, board::SPI0_SIN] {
            set_pin_mux(self.sim, line, 2);
        }
        self.sim.scgc6.modify(SCGC6::SPI0::SET);

        self.dspi.mcr.write(
            MCR::MSTR::SET
                + MCR::PCSIS.val(0)
                + MCR::CLR_TXF::SET
                + MCR::CLR_RXF::SET
                + MCR::HALT::SET,
        );

        let (cpol, cpha) = config.mode.polarity_phase();
        let divisors = baud_divisors(bus_clock_hz(), Hertz(config.frequency)).unwrap_or(
            // Slowest setting when nothing fits.
            BaudDivisors {
                pbr: 3,
                br: 15,
                sck: Hertz(0),
            },
        );
        self.dspi.ctar0.write(
            CTAR::FMSZ.val(7)
                + CTAR::CPOL.val(u32::from(cpol))
                + CTAR::CPHA.val(u32::from(cpha))
                + CTAR::LSBFE.val(u32::from(config.bit_order == BitOrder::LsbFirst))
                + CTAR::PBR.val(u32::from(divisors.pbr))
                + CTAR::BR.val(u32::from(divisors.br)),
        );

        self.dspi.sr.set(u32::MAX);
        self.dspi.mcr.modify(MCR::HALT::CLEAR);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn five_mhz_from_mulle_bus_clock() {
        // 47.99 MHz / (5 * 2) = 4.8 MHz
        let d = baud_divisors(Hertz(47_988_736), Hertz(5_000_000)).unwrap();
        assert_eq!((d.pbr, d.br), (2, 0));
        assert_eq!(d.sck, Hertz(4_798_873));
    }

    #[test]
    fn never_exceeds_target() {
        for target in [100_000, 1_000_000, 4_000_000, 12_000_000] {
            let d = baud_divisors(Hertz(47_988_736), Hertz(target)).unwrap();
            assert!(d.sck.0 <= target);
        }
    }

    #[test]
    fn reset_bus_clock_still_reaches_a_rate() {
        let d = baud_divisors(Hertz(20_971_520), Hertz(5_000_000)).unwrap();
        assert_eq!(d.sck, Hertz(3_495_253));
    }

    #[test]
    fn unreachably_slow_target_is_none() {
        assert_eq!(baud_divisors(Hertz(47_988_736), Hertz(100)), None);
    }
}
