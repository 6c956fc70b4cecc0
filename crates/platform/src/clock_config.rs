//! Clock divider configuration and derived clock frequencies for the K60.
//!
//! The SIM output dividers split MCGOUTCLK into four clock domains. Each
//! domain has a datasheet maximum that must hold for the fastest FLL output
//! the board will ever engage, which on the Mulle is the 96 MHz FLL range:
//!
//! | Domain        | Divider field | Maximum   |
//! |---------------|---------------|-----------|
//! | Core / system | OUTDIV1       | < 100 MHz |
//! | Bus           | OUTDIV2       | < 50 MHz  |
//! | FlexBus       | OUTDIV3       | < 50 MHz  |
//! | Flash         | OUTDIV4       | < 25 MHz  |
//!
//! A [`ClockDividerConfig`] can only be built through [`ClockDividerConfig::new`],
//! which checks every domain against those limits at [`DIVIDER_REFERENCE_HZ`].
//! The dividers must be written before the FLL is engaged; until then the
//! core runs from the ~20 MHz reset clock and any divider set is safe.

use core::sync::atomic::{AtomicU32, Ordering};

use thiserror_no_std::Error;

use crate::registers::{
    RegisterFile, SIM_CLKDIV1_OUTDIV1, SIM_CLKDIV1_OUTDIV2, SIM_CLKDIV1_OUTDIV3,
    SIM_CLKDIV1_OUTDIV4,
};

/// A frequency in hertz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct Hertz(pub u32);

impl Hertz {
    /// `mhz` megahertz.
    pub const fn mhz(mhz: u32) -> Self {
        Self(mhz.saturating_mul(1_000_000))
    }

    /// Raw value in hertz.
    pub const fn to_hz(self) -> u32 {
        self.0
    }

    /// This frequency divided by a non-zero integer divider.
    pub const fn divided_by(self, divider: u8) -> Option<Self> {
        match self.0.checked_div(divider as u32) {
            Some(hz) => Some(Self(hz)),
            None => None,
        }
    }
}

impl core::fmt::Display for Hertz {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}

/// MCGOUTCLK rate the divider limits are checked against.
pub const DIVIDER_REFERENCE_HZ: Hertz = Hertz::mhz(96);

/// Exclusive upper bound for the core/system clock.
pub const MAX_CORE_HZ: Hertz = Hertz::mhz(100);
/// Exclusive upper bound for the bus clock.
pub const MAX_BUS_HZ: Hertz = Hertz::mhz(50);
/// Exclusive upper bound for the FlexBus clock.
pub const MAX_FLEXBUS_HZ: Hertz = Hertz::mhz(50);
/// Exclusive upper bound for the flash clock.
pub const MAX_FLASH_HZ: Hertz = Hertz::mhz(25);

/// Largest ratio a 4-bit OUTDIV field can express.
pub const MAX_DIVIDER: u8 = 16;

/// Clock domain fed by one of the SIM output dividers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockDomain {
    /// Core and system clock (OUTDIV1).
    Core,
    /// Bus clock (OUTDIV2).
    Bus,
    /// FlexBus clock (OUTDIV3).
    FlexBus,
    /// Flash clock (OUTDIV4).
    Flash,
}

impl ClockDomain {
    /// Exclusive frequency limit of the domain.
    pub const fn limit(self) -> Hertz {
        match self {
            ClockDomain::Core => MAX_CORE_HZ,
            ClockDomain::Bus => MAX_BUS_HZ,
            ClockDomain::FlexBus => MAX_FLEXBUS_HZ,
            ClockDomain::Flash => MAX_FLASH_HZ,
        }
    }
}

/// Error returned when a divider set is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockConfigError {
    /// A divider is outside `1..=16`.
    #[error("divider {divider} for {domain:?} is outside 1..=16")]
    DividerOutOfRange {
        /// Offending domain.
        domain: ClockDomain,
        /// Rejected divider.
        divider: u8,
    },
    /// A divider leaves its domain at or above the domain limit.
    #[error("{domain:?} clock of {frequency} Hz reaches its {limit} Hz limit")]
    FrequencyTooHigh {
        /// Offending domain.
        domain: ClockDomain,
        /// Resulting frequency at [`DIVIDER_REFERENCE_HZ`].
        frequency: u32,
        /// Exclusive limit for the domain.
        limit: u32,
    },
}

/// Validated SIM output divider ratios (1-based, as on the datasheet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockDividerConfig {
    core: u8,
    bus: u8,
    flexbus: u8,
    flash: u8,
}

impl ClockDividerConfig {
    /// Mulle preset: 1-2-2-4, giving 96/48/48/24 MHz from a 96 MHz FLL.
    #[allow(clippy::panic)] // evaluated at compile time
    pub const MULLE: Self = match Self::new(1, 2, 2, 4) {
        Ok(config) => config,
        Err(_) => panic!("Mulle divider preset violates the clock limits"),
    };

    /// Validate a divider set against the domain limits at [`DIVIDER_REFERENCE_HZ`].
    ///
    /// # Errors
    ///
    /// [`ClockConfigError::DividerOutOfRange`] if any ratio is outside `1..=16`,
    /// [`ClockConfigError::FrequencyTooHigh`] if any domain would reach its limit.
    pub const fn new(core: u8, bus: u8, flexbus: u8, flash: u8) -> Result<Self, ClockConfigError> {
        if let Err(e) = check_divider(ClockDomain::Core, core) {
            return Err(e);
        }
        if let Err(e) = check_divider(ClockDomain::Bus, bus) {
            return Err(e);
        }
        if let Err(e) = check_divider(ClockDomain::FlexBus, flexbus) {
            return Err(e);
        }
        if let Err(e) = check_divider(ClockDomain::Flash, flash) {
            return Err(e);
        }
        Ok(Self {
            core,
            bus,
            flexbus,
            flash,
        })
    }

    /// Divider ratio for `domain`.
    pub const fn divider(&self, domain: ClockDomain) -> u8 {
        match domain {
            ClockDomain::Core => self.core,
            ClockDomain::Bus => self.bus,
            ClockDomain::FlexBus => self.flexbus,
            ClockDomain::Flash => self.flash,
        }
    }

    /// Domain frequency for a given MCGOUTCLK.
    pub fn frequency(&self, domain: ClockDomain, mcgout: Hertz) -> Hertz {
        // Dividers are non-zero by construction.
        mcgout.divided_by(self.divider(domain)).unwrap_or(mcgout)
    }

    /// Full `SIM_CLKDIV1` value; all four fields in one word.
    pub const fn clkdiv1(&self) -> u32 {
        // Dividers are 1..=16 by construction; fields hold ratio - 1.
        SIM_CLKDIV1_OUTDIV1.encode((self.core as u32).saturating_sub(1))
            | SIM_CLKDIV1_OUTDIV2.encode((self.bus as u32).saturating_sub(1))
            | SIM_CLKDIV1_OUTDIV3.encode((self.flexbus as u32).saturating_sub(1))
            | SIM_CLKDIV1_OUTDIV4.encode((self.flash as u32).saturating_sub(1))
    }

    /// Read the dividers currently programmed in `SIM_CLKDIV1`, unvalidated.
    #[allow(clippy::cast_possible_truncation)] // 4-bit fields
    pub fn read_raw<R: RegisterFile>(regs: &mut R) -> [u8; 4] {
        [
            SIM_CLKDIV1_OUTDIV1,
            SIM_CLKDIV1_OUTDIV2,
            SIM_CLKDIV1_OUTDIV3,
            SIM_CLKDIV1_OUTDIV4,
        ]
        .map(|field| (regs.read_field(field) as u8).saturating_add(1))
    }
}

/// Check one domain's divider against its range and frequency limit.
const fn check_divider(domain: ClockDomain, divider: u8) -> Result<(), ClockConfigError> {
    if divider == 0 || divider > MAX_DIVIDER {
        return Err(ClockConfigError::DividerOutOfRange { domain, divider });
    }
    let frequency = match DIVIDER_REFERENCE_HZ.divided_by(divider) {
        Some(hz) => hz.0,
        None => return Err(ClockConfigError::DividerOutOfRange { domain, divider }),
    };
    if frequency >= domain.limit().0 {
        return Err(ClockConfigError::FrequencyTooHigh {
            domain,
            frequency,
            limit: domain.limit().0,
        });
    }
    Ok(())
}

impl Default for ClockDividerConfig {
    fn default() -> Self {
        Self::MULLE
    }
}

/// Frequencies derived from the live clock registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Clocks {
    /// MCG output clock.
    pub mcgout: Hertz,
    /// Core/system clock.
    pub core: Hertz,
    /// Bus clock.
    pub bus: Hertz,
    /// FlexBus clock.
    pub flexbus: Hertz,
    /// Flash clock.
    pub flash: Hertz,
}

impl Clocks {
    /// Split `mcgout` through raw 1-based divider ratios.
    pub fn from_dividers(mcgout: Hertz, dividers: [u8; 4]) -> Self {
        let [core, bus, flexbus, flash] = dividers;
        let div = |d: u8| mcgout.divided_by(d).unwrap_or(mcgout);
        Self {
            mcgout,
            core: div(core),
            bus: div(bus),
            flexbus: div(flexbus),
            flash: div(flash),
        }
    }

    /// Whether every domain is under its limit.
    pub fn within_limits(&self) -> bool {
        self.core < MAX_CORE_HZ
            && self.bus < MAX_BUS_HZ
            && self.flexbus < MAX_FLEXBUS_HZ
            && self.flash < MAX_FLASH_HZ
    }
}

// ── Recorded frequencies ─────────────────────────────────────────────────────

/// Core clock out of reset: slow IRC (32.768 kHz) × FLL factor 640.
pub const RESET_CORE_CLOCK_HZ: Hertz = Hertz(20_971_520);
/// Bus clock out of reset (OUTDIV2 = 1).
pub const RESET_BUS_CLOCK_HZ: Hertz = RESET_CORE_CLOCK_HZ;

static CORE_CLOCK_HZ: AtomicU32 = AtomicU32::new(RESET_CORE_CLOCK_HZ.0);
static BUS_CLOCK_HZ: AtomicU32 = AtomicU32::new(RESET_BUS_CLOCK_HZ.0);

/// Record the post-switch frequencies for every later timing computation.
pub fn record_clocks(clocks: &Clocks) {
    CORE_CLOCK_HZ.store(clocks.core.0, Ordering::Relaxed);
    BUS_CLOCK_HZ.store(clocks.bus.0, Ordering::Relaxed);
}

/// Last recorded core clock.
pub fn core_clock_hz() -> Hertz {
    Hertz(CORE_CLOCK_HZ.load(Ordering::Relaxed))
}

/// Last recorded bus clock (DSPI and UART baud rates derive from it).
pub fn bus_clock_hz() -> Hertz {
    Hertz(BUS_CLOCK_HZ.load(Ordering::Relaxed))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn mulle_preset_is_1_2_2_4() {
        let cfg = ClockDividerConfig::MULLE;
        assert_eq!(cfg.divider(ClockDomain::Core), 1);
        assert_eq!(cfg.divider(ClockDomain::Bus), 2);
        assert_eq!(cfg.divider(ClockDomain::FlexBus), 2);
        assert_eq!(cfg.divider(ClockDomain::Flash), 4);
    }

    #[test]
    fn mulle_preset_encodes_clkdiv1() {
        // OUTDIV1=0, OUTDIV2=1, OUTDIV3=1, OUTDIV4=3
        assert_eq!(ClockDividerConfig::MULLE.clkdiv1(), 0x0113_0000);
    }

    #[test]
    fn flash_divider_of_three_is_rejected() {
        // 96 / 3 = 32 MHz > 25 MHz
        let err = ClockDividerConfig::new(1, 2, 2, 3).unwrap_err();
        assert_eq!(
            err,
            ClockConfigError::FrequencyTooHigh {
                domain: ClockDomain::Flash,
                frequency: 32_000_000,
                limit: 25_000_000,
            }
        );
    }

    #[test]
    fn bus_divider_of_one_is_rejected() {
        let err = ClockDividerConfig::new(1, 1, 2, 4).unwrap_err();
        assert!(matches!(
            err,
            ClockConfigError::FrequencyTooHigh {
                domain: ClockDomain::Bus,
                ..
            }
        ));
    }

    #[test]
    fn zero_and_seventeen_are_out_of_range() {
        assert_eq!(
            ClockDividerConfig::new(0, 2, 2, 4).unwrap_err(),
            ClockConfigError::DividerOutOfRange {
                domain: ClockDomain::Core,
                divider: 0
            }
        );
        assert_eq!(
            ClockDividerConfig::new(1, 2, 17, 4).unwrap_err(),
            ClockConfigError::DividerOutOfRange {
                domain: ClockDomain::FlexBus,
                divider: 17
            }
        );
    }

    #[test]
    fn clocks_split_fll_output() {
        let clocks = Clocks::from_dividers(Hertz(95_977_472), [1, 2, 2, 4]);
        assert_eq!(clocks.core, Hertz(95_977_472));
        assert_eq!(clocks.bus, Hertz(47_988_736));
        assert_eq!(clocks.flash, Hertz(23_994_368));
        assert!(clocks.within_limits());
    }

    #[test]
    fn zero_divider_yields_no_frequency() {
        assert_eq!(Hertz::mhz(96).divided_by(0), None);
        assert_eq!(Hertz::mhz(96).divided_by(4), Some(Hertz::mhz(24)));
        assert_eq!(Hertz::mhz(u32::MAX), Hertz(u32::MAX));
    }

    #[test]
    fn raw_dividers_read_back_one_based() {
        let mut regs = crate::mocks::SimBoard::new().registers();
        regs.write(
            crate::registers::Register::SimClkdiv1,
            ClockDividerConfig::MULLE.clkdiv1(),
        );
        assert_eq!(ClockDividerConfig::read_raw(&mut regs), [1, 2, 2, 4]);
    }

    #[test]
    fn hertz_display_includes_unit() {
        assert_eq!(std::format!("{}", Hertz::mhz(5)), "5000000 Hz");
    }
}
