//! Power management abstraction
//!
//! Rails, core bring-up and low-power mode initialisation. The rail enables
//! are plain GPIO lines; the CPU-level steps are collaborator traits so host
//! tests can observe when they run.

use crate::gpio::Line;

/// Switchable supply rails on the Mulle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RailId {
    /// Analog supply; also the reference for ADC reads.
    Avdd,
    /// Peripheral supply (radio, flash, accelerometer, NVRAM).
    Vperiph,
    /// Secondary supply (charger/secondary cell path).
    Vsec,
}

/// A supply rail and its active-high enable line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerRail {
    /// Which rail.
    pub id: RailId,
    /// Enable line, asserted high.
    pub enable: Line,
}

impl PowerRail {
    /// Declare a rail.
    pub const fn new(id: RailId, enable: Line) -> Self {
        Self { id, enable }
    }
}

/// CPU-dependent initialisation.
pub trait CoreInit {
    /// Error type
    type Error: core::fmt::Debug;

    /// Start the 32.768 kHz RTC oscillator. Called first so the crystal has
    /// time to settle before the FLL is locked to it.
    fn start_reference_oscillator(&mut self) -> Result<(), Self::Error>;

    /// Core setup that needs a settled clock: peripheral clock gates and
    /// anything timed from the core frequency.
    fn init_core(&mut self) -> Result<(), Self::Error>;
}

/// Low-power mode subsystem initialiser, invoked last during bring-up.
pub trait LowPowerInit {
    /// Error type
    type Error: core::fmt::Debug;

    /// Allow the stop modes the low-power scheduler will enter later.
    fn init_low_power(&mut self) -> Result<(), Self::Error>;
}

/// Power modes the low-power subsystem may be allowed to enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopMode {
    /// Very low power run/wait/stop.
    VeryLowPower,
    /// Low leakage stop.
    LowLeakageStop,
    /// Very low leakage stop.
    VeryLowLeakageStop,
}

impl StopMode {
    /// Every mode bring-up unlocks.
    pub const ALL: [StopMode; 3] = [
        StopMode::VeryLowPower,
        StopMode::LowLeakageStop,
        StopMode::VeryLowLeakageStop,
    ];

    /// `SMC_PMPROT` bit allowing the mode.
    pub const fn pmprot_bit(self) -> u8 {
        match self {
            StopMode::VeryLowPower => 0x20,
            StopMode::LowLeakageStop => 0x08,
            StopMode::VeryLowLeakageStop => 0x02,
        }
    }
}

/// `SMC_PMPROT` value allowing every mode in `modes`.
pub fn pmprot_value(modes: &[StopMode]) -> u8 {
    modes.iter().fold(0, |acc, mode| acc | mode.pmprot_bit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pmprot_for_all_modes() {
        assert_eq!(pmprot_value(&StopMode::ALL), 0x2A);
        assert_eq!(pmprot_value(&[]), 0);
    }
}
