//! Clock sequencing: dividers, reference, FLL engage, settle, refresh.
//!
//! Leaving reset the K60 runs FEI at ≈21 MHz with every SIM divider at 1.
//! Engaging FEE at factor 2929 takes MCGOUTCLK to ≈96 MHz, which would put
//! the bus and flash clocks far past their limits if the dividers were still
//! at reset. The phases therefore hand each other proof tokens:
//!
//! ```text
//! configure_dividers ─DividersConfigured─▶ switch_mode ─ModeEngaged─▶
//! await_stabilization ─ClocksSettled─▶ refresh_derived_frequency
//! ```
//!
//! [`ClocksSettled`] is also what the CPU-dependent step in [`crate::boot`]
//! requires, so nothing core-dependent can run on an unsettled clock.

use core::marker::PhantomData;

use platform::clock_config::record_clocks;
use platform::registers::SIM_SOPT2_PLLFLLSEL;
use platform::{
    mcg, ClockDividerConfig, Clocks, FllFactor, FllMode, FllReference, Hertz, ReferenceSelect,
    RegisterFile, SelectedRevision, SpinDelay,
};

use crate::config::BringupConfig;

/// SIM output dividers hold safe values for the target mode.
#[derive(Debug)]
#[must_use]
pub struct DividersConfigured {
    _private: (),
}

/// The MCG has been committed to its target mode.
#[derive(Debug)]
#[must_use]
pub struct ModeEngaged {
    _private: (),
}

/// The clock has settled; later timing may rely on it.
#[derive(Debug)]
#[must_use]
pub struct ClocksSettled {
    _private: (),
}

/// Drives the clock phases of bring-up for silicon revision `V`.
pub struct ClockSequencer<R, D, V = SelectedRevision> {
    regs: R,
    delay: D,
    revision: PhantomData<V>,
}

impl<R, D> ClockSequencer<R, D>
where
    R: RegisterFile,
    D: SpinDelay,
{
    /// Sequencer for the revision this build targets.
    pub fn new(regs: R, delay: D) -> Self {
        Self::for_revision(regs, delay)
    }
}

impl<R, D, V> ClockSequencer<R, D, V>
where
    R: RegisterFile,
    D: SpinDelay,
    V: ReferenceSelect,
{
    /// Sequencer for an explicit revision.
    pub fn for_revision(regs: R, delay: D) -> Self {
        Self {
            regs,
            delay,
            revision: PhantomData,
        }
    }

    /// Program all four SIM output dividers in one `SIM_CLKDIV1` write.
    pub fn configure_dividers(&mut self, dividers: &ClockDividerConfig) -> DividersConfigured {
        let value = dividers.clkdiv1();
        self.regs.write(platform::Register::SimClkdiv1, value);
        debug!("SIM_CLKDIV1 = {:#x}", value);
        DividersConfigured { _private: () }
    }

    /// Select the FLL as peripheral clock source and route `source` to it.
    ///
    /// The register path is fixed by `V`; see [`platform::revision`].
    /// Returns the routing read back from the registers.
    pub fn select_reference(&mut self, source: FllReference) -> FllReference {
        self.regs.clear_field(SIM_SOPT2_PLLFLLSEL);
        V::select_reference(&mut self.regs, source);
        let routed = V::selected_reference(&mut self.regs);
        if routed == source {
            debug!("rev {} reference {:?}", V::REVISION, source);
        } else {
            warn!("rev {} reference {:?} reads back as {:?}", V::REVISION, source, routed);
        }
        routed
    }

    /// Commit the MCG to `mode`; returns once the status register agrees.
    pub fn switch_mode(
        &mut self,
        _dividers: DividersConfigured,
        mode: FllMode,
        factor: FllFactor,
    ) -> ModeEngaged {
        mcg::switch_mode(&mut self.regs, mode, factor);
        debug!("MCG {:?}, FLL factor {}", mode, factor.multiplier());
        ModeEngaged { _private: () }
    }

    /// Calibrated busy-wait after the mode switch.
    ///
    /// Any diagnostic output running off the core clock (RTT, UART) may be
    /// garbled until this returns.
    pub fn await_stabilization(&mut self, _engaged: ModeEngaged, iterations: u32) -> ClocksSettled {
        self.delay.spin(iterations);
        ClocksSettled { _private: () }
    }

    /// Recompute the clock tree from the live registers and record it.
    ///
    /// Returns `None` if the registers describe a mode this board does not
    /// use; the previously recorded frequencies are left untouched then.
    pub fn refresh_derived_frequency(
        &mut self,
        _settled: &ClocksSettled,
        reference: Hertz,
    ) -> Option<Clocks> {
        let clocks = mcg::derive_clocks(&mut self.regs, reference)?;
        record_clocks(&clocks);
        Some(clocks)
    }

    /// Run every clock phase in order.
    pub fn run(&mut self, config: &BringupConfig) -> (ClocksSettled, Option<Clocks>) {
        let dividers = self.configure_dividers(&config.dividers);
        let _routed = self.select_reference(config.reference);
        let engaged = self.switch_mode(dividers, config.fll_mode, config.fll_factor);
        let settled = self.await_stabilization(engaged, config.stabilization_spins);
        let clocks = self.refresh_derived_frequency(&settled, config.reference_hz);
        match clocks {
            Some(c) => info!("clocks settled: core {} bus {} flash {}", c.core, c.bus, c.flash),
            None => warn!("clocks settled in an undecodable MCG mode"),
        }
        (settled, clocks)
    }

    /// Give the register file and delay back.
    pub fn release(self) -> (R, D) {
        (self.regs, self.delay)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use platform::mcg::RTC_OSCILLATOR_HZ;
    use platform::mocks::{BoardEvent, SimBoard};
    use platform::revision::K60Revision;
    use platform::{McgMode, Register};

    #[test]
    fn dividers_are_one_write_before_any_mcg_write() {
        let board = SimBoard::new();
        let mut seq = ClockSequencer::new(board.registers(), board.delay());
        let _ = seq.run(&BringupConfig::mulle());

        let writes = board.register_writes();
        let clkdiv: Vec<_> = writes
            .iter()
            .enumerate()
            .filter(|(_, (r, _))| *r == Register::SimClkdiv1)
            .collect();
        assert_eq!(clkdiv.len(), 1);
        assert_eq!(clkdiv[0].1 .1, ClockDividerConfig::MULLE.clkdiv1());

        let first_mcg_c1 = writes
            .iter()
            .position(|(r, _)| *r == Register::McgC1)
            .unwrap();
        assert!(clkdiv[0].0 < first_mcg_c1);
    }

    #[test]
    fn stabilization_spin_follows_mode_switch() {
        let board = SimBoard::new();
        let mut seq = ClockSequencer::new(board.registers(), board.delay());
        let _ = seq.run(&BringupConfig::mulle());

        let last_c1 = board
            .events()
            .iter()
            .rposition(|e| matches!(e, BoardEvent::RegisterWrite { register: Register::McgC1, .. }))
            .unwrap();
        let spin = board.position(|e| *e == BoardEvent::Spin(100_000)).unwrap();
        assert!(last_c1 < spin);
    }

    #[test]
    fn run_engages_fee_and_records_clocks() {
        let board = SimBoard::new();
        let mut seq = ClockSequencer::new(board.registers(), board.delay());
        let (_settled, clocks) = seq.run(&BringupConfig::mulle());
        let clocks = clocks.unwrap();

        let (mut regs, _) = seq.release();
        assert_eq!(mcg::current_mode(&mut regs), Some(McgMode::Fee));
        assert_eq!(clocks.mcgout, Hertz(95_977_472));
        assert_eq!(clocks.bus, Hertz(47_988_736));
        assert_eq!(clocks.flash, Hertz(23_994_368));
        assert!(clocks.within_limits());
    }

    #[test]
    fn reference_select_clears_pllfllsel_first() {
        let board = SimBoard::new();
        board.preset_register(Register::SimSopt2, 1 << 16);
        let mut seq: ClockSequencer<_, _, K60Revision<2>> =
            ClockSequencer::for_revision(board.registers(), board.delay());
        assert_eq!(seq.select_reference(FllReference::Rtc32k), FllReference::Rtc32k);
        assert_eq!(board.register(Register::SimSopt2) & (1 << 16), 0);
        assert_eq!(board.register(Register::McgC7), 1);
    }

    #[test]
    fn revision_one_uses_sopt2_path() {
        let board = SimBoard::new();
        let mut seq: ClockSequencer<_, _, K60Revision<1>> =
            ClockSequencer::for_revision(board.registers(), board.delay());
        assert_eq!(seq.select_reference(FllReference::Rtc32k), FllReference::Rtc32k);
        assert_eq!(board.register(Register::SimSopt2) & 1, 1);
        assert!(!board
            .register_writes()
            .iter()
            .any(|(r, _)| *r == Register::McgC7));
    }

    #[test]
    fn refresh_reports_reset_clock_before_any_switch() {
        let board = SimBoard::new();
        let mut seq = ClockSequencer::new(board.registers(), board.delay());
        let divs = seq.configure_dividers(&ClockDividerConfig::MULLE);
        let engaged = seq.switch_mode(divs, FllMode::Fei, FllFactor::RESET);
        let settled = seq.await_stabilization(engaged, 0);
        let clocks = seq
            .refresh_derived_frequency(&settled, RTC_OSCILLATOR_HZ)
            .unwrap();
        assert_eq!(clocks.mcgout, Hertz(20_971_520));
        assert_eq!(clocks.bus, Hertz(10_485_760));
    }
}
