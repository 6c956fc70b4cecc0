//! Peripheral abstraction layer
//!
//! SPI transfers go through `embedded_hal::spi::SpiBus<u8>`. Chip selects are
//! plain GPIO lines driven by the caller, which is how the Mulle's four SPI0
//! devices share the bus. [`SpiMaster`] adds the one operation embedded-hal
//! leaves out: programming the bus as master for a given [`SpiConfig`].

use embedded_hal::spi::SpiBus;

/// SPI configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
    /// SPI mode (CPOL, CPHA)
    pub mode: SpiMode,
    /// Bit order
    pub bit_order: BitOrder,
}

impl SpiConfig {
    /// Mode 0, MSB first at `frequency`.
    pub const fn mode0(frequency: u32) -> Self {
        Self {
            frequency,
            mode: SpiMode::Mode0,
            bit_order: BitOrder::MsbFirst,
        }
    }
}

/// SPI modes (CPOL, CPHA)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiMode {
    /// Mode 0: CPOL=0, CPHA=0 (data captured on the first, rising edge)
    Mode0,
    /// Mode 1: CPOL=0, CPHA=1
    Mode1,
    /// Mode 2: CPOL=1, CPHA=0
    Mode2,
    /// Mode 3: CPOL=1, CPHA=1
    Mode3,
}

impl SpiMode {
    /// `(cpol, cpha)` bits.
    pub const fn polarity_phase(self) -> (bool, bool) {
        match self {
            SpiMode::Mode0 => (false, false),
            SpiMode::Mode1 => (false, true),
            SpiMode::Mode2 => (true, false),
            SpiMode::Mode3 => (true, true),
        }
    }
}

/// Bit order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitOrder {
    /// Most significant bit first
    MsbFirst,
    /// Least significant bit first
    LsbFirst,
}

/// SPI bus that can be (re)initialised as master.
pub trait SpiMaster: SpiBus<u8> {
    /// Enable the module clock and program the bus as master with `config`.
    fn init_master(&mut self, config: &SpiConfig) -> Result<(), Self::Error>;
}

impl<T: SpiMaster + ?Sized> SpiMaster for &mut T {
    fn init_master(&mut self, config: &SpiConfig) -> Result<(), Self::Error> {
        (**self).init_master(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode0_is_first_rising_edge() {
        let cfg = SpiConfig::mode0(5_000_000);
        assert_eq!(cfg.mode.polarity_phase(), (false, false));
        assert_eq!(cfg.bit_order, BitOrder::MsbFirst);
    }

    #[test]
    fn mode3_sets_both_bits() {
        assert_eq!(SpiMode::Mode3.polarity_phase(), (true, true));
    }
}
