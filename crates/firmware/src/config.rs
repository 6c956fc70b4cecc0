//! Bring-up configuration.
//!
//! Everything the sequence needs is collected in one [`BringupConfig`],
//! built once before the sequence runs and never changed afterwards.
//! [`BringupConfig::mulle`] is the production preset; tests construct
//! variants of it.

use core::num::NonZeroU32;

use heapless::Vec;
use platform::board::{self, trace};
use platform::{ClockDividerConfig, FllFactor, FllMode, FllReference, Hertz, Line, SpiConfig};

/// Spin iterations after the FEE switch before anything trusts the clock.
///
/// Calibrated on a Mulle running the 96 MHz FEE configuration; not derived
/// from a frequency. Another clock setup needs a new measurement.
pub const STABILIZATION_SPINS: u32 = 100_000;

/// Spin iterations between a `FORCE_TRX_OFF` and the next status read.
///
/// Calibrated the same way as [`STABILIZATION_SPINS`].
pub const RADIO_SETTLE_SPINS: u32 = 10_000;

/// Number of optional trace outputs the board can carry.
pub const MAX_TRACE_PINS: usize = 6;

/// Trace outputs compiled into this build, in a fixed order.
pub type TracePins = Vec<Line, MAX_TRACE_PINS>;

/// What bring-up does with the AT86RF231.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioPolicy {
    /// Force the transceiver to `TRX_OFF` and assert SLEEP_TR.
    SleepOnBoot,
    /// A radio driver initialises the transceiver later; leave it alone.
    OwnedByDriver,
}

/// Immutable inputs of the boot sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BringupConfig {
    /// SIM output dividers, programmed before the mode switch.
    pub dividers: ClockDividerConfig,
    /// Reference routed to the FLL.
    pub reference: FllReference,
    /// Frequency of that reference, used to derive the resulting clocks.
    pub reference_hz: Hertz,
    /// FLL mode to engage.
    pub fll_mode: FllMode,
    /// DCO range and fine-tune for the engaged mode.
    pub fll_factor: FllFactor,
    /// Calibrated spin after the mode switch.
    pub stabilization_spins: u32,
    /// Calibrated spin between radio force-off and the next status read.
    pub radio_settle_spins: u32,
    /// SPI0 master configuration for the on-board devices.
    pub spi: SpiConfig,
    /// Trace outputs to configure.
    pub trace_pins: TracePins,
    /// Radio handling.
    pub radio: RadioPolicy,
    /// Give up on the radio after this many status reads.
    ///
    /// Test instrumentation only. Production leaves this `None`, and the
    /// convergence loop then waits for the transceiver indefinitely.
    pub radio_attempt_limit: Option<NonZeroU32>,
}

impl BringupConfig {
    /// Production preset for the Mulle.
    ///
    /// 1-2-2-4 dividers, FEE from the RTC crystal at factor 2929 (≈96 MHz),
    /// SPI0 at 5 MHz mode 0, trace pins and radio policy from Cargo features.
    pub fn mulle() -> Self {
        Self {
            dividers: ClockDividerConfig::MULLE,
            reference: FllReference::Rtc32k,
            reference_hz: platform::mcg::RTC_OSCILLATOR_HZ,
            fll_mode: FllMode::Fee,
            fll_factor: FllFactor::F2929,
            stabilization_spins: STABILIZATION_SPINS,
            radio_settle_spins: RADIO_SETTLE_SPINS,
            spi: SpiConfig::mode0(board::ONBOARD_SPI_HZ),
            trace_pins: enabled_trace_pins(),
            radio: if cfg!(feature = "radio-driver") {
                RadioPolicy::OwnedByDriver
            } else {
                RadioPolicy::SleepOnBoot
            },
            radio_attempt_limit: None,
        }
    }
}

impl Default for BringupConfig {
    fn default() -> Self {
        Self::mulle()
    }
}

/// Trace outputs selected by the `trace-*` features.
pub fn enabled_trace_pins() -> TracePins {
    let candidates = [
        (cfg!(feature = "trace-lpm-entry"), trace::LPM_ENTRY),
        (cfg!(feature = "trace-lpm-exit"), trace::LPM_EXIT),
        (cfg!(feature = "trace-wait"), trace::WAIT),
        (cfg!(feature = "trace-stop"), trace::STOP),
        (cfg!(feature = "trace-vlps"), trace::VLPS),
        (cfg!(feature = "trace-lls"), trace::LLS),
    ];
    candidates
        .into_iter()
        .filter_map(|(enabled, line)| enabled.then_some(line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::ClockDomain;

    #[test]
    fn mulle_preset_matches_board() {
        let cfg = BringupConfig::mulle();
        assert_eq!(cfg.dividers, ClockDividerConfig::MULLE);
        assert_eq!(cfg.reference, FllReference::Rtc32k);
        assert_eq!(cfg.fll_mode, FllMode::Fee);
        assert_eq!(cfg.spi, SpiConfig::mode0(5_000_000));
        assert_eq!(cfg.stabilization_spins, 100_000);
        assert_eq!(cfg.radio_settle_spins, 10_000);
        assert!(cfg.radio_attempt_limit.is_none());
    }

    #[test]
    fn preset_dividers_keep_flash_under_limit() {
        let cfg = BringupConfig::mulle();
        let flash = cfg
            .dividers
            .frequency(ClockDomain::Flash, platform::clock_config::DIVIDER_REFERENCE_HZ);
        assert!(flash < ClockDomain::Flash.limit());
    }

    #[test]
    fn trace_pins_follow_features() {
        let pins = enabled_trace_pins();
        assert_eq!(pins.contains(&trace::LPM_ENTRY), cfg!(feature = "trace-lpm-entry"));
        assert_eq!(pins.contains(&trace::LLS), cfg!(feature = "trace-lls"));
        #[cfg(not(any(
            feature = "trace-lpm-entry",
            feature = "trace-lpm-exit",
            feature = "trace-wait",
            feature = "trace-stop",
            feature = "trace-vlps",
            feature = "trace-lls"
        )))]
        assert!(pins.is_empty());
    }

    #[test]
    fn radio_policy_follows_feature() {
        let expected = if cfg!(feature = "radio-driver") {
            RadioPolicy::OwnedByDriver
        } else {
            RadioPolicy::SleepOnBoot
        };
        assert_eq!(BringupConfig::mulle().radio, expected);
    }
}
