//! Multipurpose Clock Generator (MCG) mode driver.
//!
//! Bring-up only ever engages the FLL: FEI out of reset, FEE once the RTC
//! oscillator has been routed to the MCG external reference. The driver can
//! still *decode* every MCG mode so a log line after the switch shows where the
//! clock generator actually ended up.
//!
//! ```text
//!  CLKS  IREFS  PLLS  LP   mode
//!   0      1     0    x    FEI
//!   0      0     0    x    FEE
//!   1      1     0    0    FBI
//!   2      0     0    0    FBE
//!   0      0     1    x    PEE
//!   2      0     1    0    PBE
//!   1      1     0    1    BLPI
//!   2      0     x    1    BLPE
//! ```

use crate::clock_config::{ClockDividerConfig, Clocks, Hertz};
use crate::registers::{
    RegisterFile, MCG_C1_CLKS, MCG_C1_FRDIV, MCG_C1_IREFS, MCG_C2_LP, MCG_C2_RANGE0,
    MCG_C4_DMX32, MCG_C4_DRST_DRS, MCG_C6_PLLS, MCG_S_CLKST, MCG_S_IREFST,
};

/// Slow internal reference clock.
pub const SLOW_IRC_HZ: Hertz = Hertz(32_768);

/// RTC crystal oscillator, the Mulle's FLL external reference.
pub const RTC_OSCILLATOR_HZ: Hertz = Hertz(32_768);

/// `MCG_C1.CLKS` / `MCG_S.CLKST` encodings.
mod clks {
    pub const LOCKED_LOOP: u32 = 0;
    pub const INTERNAL: u32 = 1;
    pub const EXTERNAL: u32 = 2;
}

/// Decoded MCG operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum McgMode {
    /// FLL engaged, internal reference.
    Fei,
    /// FLL engaged, external reference.
    Fee,
    /// FLL bypassed, internal reference.
    Fbi,
    /// FLL bypassed, external reference.
    Fbe,
    /// PLL bypassed, external reference.
    Pbe,
    /// PLL engaged, external reference.
    Pee,
    /// Bypassed low power, internal reference.
    Blpi,
    /// Bypassed low power, external reference.
    Blpe,
}

/// Read `C1`, `C2` and `C6` and decode the mode they request.
///
/// Returns `None` for register combinations the reference manual does not
/// define as a mode (for example CLKS = 3).
pub fn current_mode<R: RegisterFile>(regs: &mut R) -> Option<McgMode> {
    let clks = regs.read_field(MCG_C1_CLKS);
    let irefs = regs.read_field(MCG_C1_IREFS) == 1;
    let plls = regs.read_field(MCG_C6_PLLS) == 1;
    let lp = regs.read_field(MCG_C2_LP) == 1;

    match (clks, irefs, plls, lp) {
        (clks::LOCKED_LOOP, true, false, _) => Some(McgMode::Fei),
        (clks::LOCKED_LOOP, false, false, _) => Some(McgMode::Fee),
        (clks::INTERNAL, true, false, false) => Some(McgMode::Fbi),
        (clks::EXTERNAL, false, false, false) => Some(McgMode::Fbe),
        (clks::LOCKED_LOOP, false, true, _) => Some(McgMode::Pee),
        (clks::EXTERNAL, false, true, false) => Some(McgMode::Pbe),
        (clks::INTERNAL, true, false, true) => Some(McgMode::Blpi),
        (clks::EXTERNAL, false, _, true) => Some(McgMode::Blpe),
        _ => None,
    }
}

/// FLL-engaged modes the driver can switch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FllMode {
    /// FLL engaged internal (reset mode).
    Fei,
    /// FLL engaged external.
    Fee,
}

impl From<FllMode> for McgMode {
    fn from(mode: FllMode) -> Self {
        match mode {
            FllMode::Fei => McgMode::Fei,
            FllMode::Fee => McgMode::Fee,
        }
    }
}

/// DCO range (`MCG_C4.DRST_DRS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DcoRange {
    /// 20-25 MHz.
    Low = 0,
    /// 40-50 MHz.
    Mid = 1,
    /// 60-75 MHz.
    MidHigh = 2,
    /// 80-100 MHz.
    High = 3,
}

impl DcoRange {
    const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => DcoRange::Low,
            1 => DcoRange::Mid,
            2 => DcoRange::MidHigh,
            _ => DcoRange::High,
        }
    }
}

/// FLL multiplication factor: DCO range plus the 32.768 kHz fine-tune bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FllFactor {
    /// DCO range.
    pub range: DcoRange,
    /// `MCG_C4.DMX32`: DCO tuned for a 32.768 kHz reference.
    pub dmx32: bool,
}

impl FllFactor {
    /// Reset factor: 640 (≈20.97 MHz from 32.768 kHz).
    pub const RESET: Self = Self {
        range: DcoRange::Low,
        dmx32: false,
    };

    /// Factor 2929 (≈95.98 MHz from 32.768 kHz).
    pub const F2929: Self = Self {
        range: DcoRange::High,
        dmx32: true,
    };

    /// Numeric multiplier applied to the FLL reference.
    pub const fn multiplier(self) -> u32 {
        match (self.dmx32, self.range) {
            (false, DcoRange::Low) => 640,
            (false, DcoRange::Mid) => 1280,
            (false, DcoRange::MidHigh) => 1920,
            (false, DcoRange::High) => 2560,
            (true, DcoRange::Low) => 732,
            (true, DcoRange::Mid) => 1464,
            (true, DcoRange::MidHigh) => 2197,
            (true, DcoRange::High) => 2929,
        }
    }

    /// Decode the factor currently programmed in `MCG_C4`.
    pub fn read<R: RegisterFile>(regs: &mut R) -> Self {
        Self {
            range: DcoRange::from_bits(regs.read_field(MCG_C4_DRST_DRS)),
            dmx32: regs.read_field(MCG_C4_DMX32) == 1,
        }
    }
}

impl Default for FllFactor {
    fn default() -> Self {
        Self::RESET
    }
}

/// Commit the MCG to `mode` with FLL multiplier `factor`.
///
/// The reference must already be routed (see [`crate::revision`]). Returns
/// once `MCG_S` reports the requested reference and the FLL output as
/// MCGOUTCLK. The wait has no bound: the status bits follow the control bits
/// within a few reference cycles on working silicon.
pub fn switch_mode<R: RegisterFile>(regs: &mut R, mode: FllMode, factor: FllFactor) {
    regs.clear_field(MCG_C6_PLLS);

    regs.modify(MCG_C4_DMX32.register, |c4| {
        let c4 = (c4 & !MCG_C4_DMX32.mask()) | MCG_C4_DMX32.encode(u32::from(factor.dmx32));
        (c4 & !MCG_C4_DRST_DRS.mask()) | MCG_C4_DRST_DRS.encode(factor.range as u32)
    });

    let irefs = match mode {
        FllMode::Fei => 1,
        FllMode::Fee => 0,
    };

    // FRDIV = 0: a 32.768 kHz reference in the low range is already inside
    // the 31.25-39.0625 kHz FLL input window.
    regs.modify(MCG_C1_CLKS.register, |c1| {
        let c1 = c1 & !(MCG_C1_CLKS.mask() | MCG_C1_FRDIV.mask() | MCG_C1_IREFS.mask());
        c1 | MCG_C1_CLKS.encode(clks::LOCKED_LOOP) | MCG_C1_IREFS.encode(irefs)
    });

    while regs.read_field(MCG_S_IREFST) != irefs {
        core::hint::spin_loop();
    }
    while regs.read_field(MCG_S_CLKST) != clks::LOCKED_LOOP {
        core::hint::spin_loop();
    }
}

/// FLL reference divider selected by `MCG_C1.FRDIV` for the current `RANGE0`.
fn frdiv_divider(frdiv: u32, range0: u32) -> Option<u32> {
    if range0 == 0 {
        return 1u32.checked_shl(frdiv);
    }
    match frdiv {
        0..=4 => 32u32.checked_shl(frdiv),
        5 => Some(1280),
        6 => Some(1536),
        _ => None,
    }
}

/// MCGOUTCLK for the current mode, given the external reference frequency.
///
/// `None` for PLL modes (not used on this board) and undecodable states.
pub fn mcgout_frequency<R: RegisterFile>(regs: &mut R, external: Hertz) -> Option<Hertz> {
    let factor = FllFactor::read(regs).multiplier();
    match current_mode(regs)? {
        McgMode::Fei => SLOW_IRC_HZ.0.checked_mul(factor).map(Hertz),
        McgMode::Fee => {
            let divider = frdiv_divider(
                regs.read_field(MCG_C1_FRDIV),
                regs.read_field(MCG_C2_RANGE0),
            )?;
            external
                .0
                .checked_div(divider)?
                .checked_mul(factor)
                .map(Hertz)
        }
        McgMode::Fbi | McgMode::Blpi => Some(SLOW_IRC_HZ),
        McgMode::Fbe | McgMode::Blpe => Some(external),
        McgMode::Pbe | McgMode::Pee => None,
    }
}

/// Every clock domain derived from the live MCG and `SIM_CLKDIV1` registers.
pub fn derive_clocks<R: RegisterFile>(regs: &mut R, external: Hertz) -> Option<Clocks> {
    let mcgout = mcgout_frequency(regs, external)?;
    let dividers = ClockDividerConfig::read_raw(regs);
    Some(Clocks::from_dividers(mcgout, dividers))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mocks::SimBoard;
    use crate::registers::Register;

    #[test]
    fn reset_state_decodes_as_fei_at_20_97_mhz() {
        let board = SimBoard::new();
        let mut regs = board.registers();
        assert_eq!(current_mode(&mut regs), Some(McgMode::Fei));
        assert_eq!(
            mcgout_frequency(&mut regs, RTC_OSCILLATOR_HZ),
            Some(Hertz(20_971_520))
        );
    }

    #[test]
    fn fee_with_factor_2929_runs_near_96_mhz() {
        let board = SimBoard::new();
        let mut regs = board.registers();
        switch_mode(&mut regs, FllMode::Fee, FllFactor::F2929);

        assert_eq!(current_mode(&mut regs), Some(McgMode::Fee));
        assert_eq!(board.register(Register::McgC4) & 0xE0, 0xE0);
        assert_eq!(board.register(Register::McgC1) & 0x04, 0);
        assert_eq!(
            mcgout_frequency(&mut regs, RTC_OSCILLATOR_HZ),
            Some(Hertz(95_977_472))
        );
    }

    #[test]
    fn switch_preserves_c4_trim_bits() {
        let board = SimBoard::new();
        board.preset_register(Register::McgC4, 0x1F);
        let mut regs = board.registers();
        switch_mode(&mut regs, FllMode::Fee, FllFactor::F2929);
        assert_eq!(board.register(Register::McgC4), 0xFF);
    }

    #[test]
    fn derived_clocks_use_programmed_dividers() {
        let board = SimBoard::new();
        let mut regs = board.registers();
        regs.write(Register::SimClkdiv1, ClockDividerConfig::MULLE.clkdiv1());
        switch_mode(&mut regs, FllMode::Fee, FllFactor::F2929);

        let clocks = derive_clocks(&mut regs, RTC_OSCILLATOR_HZ).unwrap();
        assert_eq!(clocks.core, Hertz(95_977_472));
        assert_eq!(clocks.bus, Hertz(47_988_736));
        assert!(clocks.within_limits());
    }

    #[test]
    fn frdiv_table_covers_both_ranges() {
        assert_eq!(frdiv_divider(0, 0), Some(1));
        assert_eq!(frdiv_divider(7, 0), Some(128));
        assert_eq!(frdiv_divider(0, 1), Some(32));
        assert_eq!(frdiv_divider(4, 2), Some(512));
        assert_eq!(frdiv_divider(5, 1), Some(1280));
        assert_eq!(frdiv_divider(6, 1), Some(1536));
        assert_eq!(frdiv_divider(7, 1), None);
    }

    #[test]
    fn undefined_clks_value_is_not_a_mode() {
        let board = SimBoard::new();
        board.preset_register(Register::McgC1, 0xC0);
        let mut regs = board.registers();
        assert_eq!(current_mode(&mut regs), None);
        assert_eq!(mcgout_frequency(&mut regs, RTC_OSCILLATOR_HZ), None);
    }

    #[test]
    fn factor_table_matches_reference_manual() {
        assert_eq!(FllFactor::RESET.multiplier(), 640);
        assert_eq!(FllFactor::F2929.multiplier(), 2929);
        let f = FllFactor {
            range: DcoRange::Mid,
            dmx32: true,
        };
        assert_eq!(f.multiplier(), 1464);
    }
}
