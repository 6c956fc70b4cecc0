//! Silicon-revision specific reference-clock selection.
//!
//! K60 mask revision 1 and revision 2 route the 32 kHz RTC oscillator to the
//! MCG through different registers:
//!
//! | Step                    | Rev 1                       | Rev 2                          |
//! |-------------------------|-----------------------------|--------------------------------|
//! | OSC32KSEL → RTC 32 kHz  | `SIM_SOPT1` bit 19 set      | `SIM_SOPT1[19:18] = 0b10`      |
//! | MCG external ref → RTC  | `SIM_SOPT2.MCGCLKSEL` set   | `MCG_C7.OSCSEL` set            |
//!
//! Each layout is a [`ReferenceSelect`] implementation on [`K60Revision`].
//! Only `K60Revision<1>` and `K60Revision<2>` implement it, so naming any
//! other revision where a selector is required is a compile error:
//!
//! ```compile_fail
//! use platform::registers::RegisterFile;
//! use platform::revision::{FllReference, K60Revision, ReferenceSelect};
//!
//! fn select<R: RegisterFile>(regs: &mut R) {
//!     K60Revision::<3>::select_reference(regs, FllReference::Rtc32k);
//! }
//! ```
//!
//! The board's revision is fixed at build time by `K60_CPU_REV` (see the
//! crate build script) and exported as [`SelectedRevision`]; there is no
//! runtime branch on the revision anywhere.

use crate::registers::{
    RegisterFile, MCG_C7_OSCSEL, SIM_SOPT1_OSC32KSEL_REV1, SIM_SOPT1_OSC32KSEL_REV2,
    SIM_SOPT2_MCGCLKSEL,
};

/// Reference clock feeding the FLL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FllReference {
    /// Reset routing: the MCG external reference is the system oscillator and
    /// the FLL is expected to run from the slow internal reference (FEI).
    Internal,
    /// The 32.768 kHz RTC crystal oscillator (FEE on the Mulle).
    Rtc32k,
}

/// K60 mask revision marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct K60Revision<const REV: u8>;

/// Revision-specific register path for [`FllReference`] selection.
pub trait ReferenceSelect {
    /// Revision number, for logs.
    const REVISION: u8;

    /// Route `source` to the FLL external-reference input.
    fn select_reference<R: RegisterFile>(regs: &mut R, source: FllReference);

    /// Decode which reference the registers currently route.
    fn selected_reference<R: RegisterFile>(regs: &mut R) -> FllReference;
}

/// `SIM_SOPT1.OSC32KSEL` value (rev 2) selecting the RTC oscillator.
const OSC32KSEL_REV2_RTC: u32 = 0b10;

impl ReferenceSelect for K60Revision<1> {
    const REVISION: u8 = 1;

    fn select_reference<R: RegisterFile>(regs: &mut R, source: FllReference) {
        match source {
            FllReference::Rtc32k => {
                regs.set_field(SIM_SOPT1_OSC32KSEL_REV1);
                regs.set_field(SIM_SOPT2_MCGCLKSEL);
            }
            FllReference::Internal => {
                regs.clear_field(SIM_SOPT1_OSC32KSEL_REV1);
                regs.clear_field(SIM_SOPT2_MCGCLKSEL);
            }
        }
    }

    fn selected_reference<R: RegisterFile>(regs: &mut R) -> FllReference {
        if regs.read_field(SIM_SOPT2_MCGCLKSEL) == 1 {
            FllReference::Rtc32k
        } else {
            FllReference::Internal
        }
    }
}

impl ReferenceSelect for K60Revision<2> {
    const REVISION: u8 = 2;

    fn select_reference<R: RegisterFile>(regs: &mut R, source: FllReference) {
        match source {
            FllReference::Rtc32k => {
                regs.write_field(SIM_SOPT1_OSC32KSEL_REV2, OSC32KSEL_REV2_RTC);
                regs.write(MCG_C7_OSCSEL.register, MCG_C7_OSCSEL.mask());
            }
            FllReference::Internal => {
                regs.write_field(SIM_SOPT1_OSC32KSEL_REV2, 0);
                regs.write(MCG_C7_OSCSEL.register, 0);
            }
        }
    }

    fn selected_reference<R: RegisterFile>(regs: &mut R) -> FllReference {
        if regs.read_field(MCG_C7_OSCSEL) == 1 {
            FllReference::Rtc32k
        } else {
            FllReference::Internal
        }
    }
}

/// Revision this build targets (`K60_CPU_REV=1`).
#[cfg(k60_cpu_rev = "1")]
pub type SelectedRevision = K60Revision<1>;

/// Revision this build targets (`K60_CPU_REV=2`).
#[cfg(k60_cpu_rev = "2")]
pub type SelectedRevision = K60Revision<2>;

#[cfg(not(any(k60_cpu_rev = "1", k60_cpu_rev = "2")))]
compile_error!("Unknown K60 CPU revision: set K60_CPU_REV to 1 or 2");

/// Numeric revision of [`SelectedRevision`].
pub const CPU_REVISION: u8 = <SelectedRevision as ReferenceSelect>::REVISION;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mocks::SimBoard;
    use crate::registers::Register;

    fn written_registers(board: &SimBoard) -> std::vec::Vec<Register> {
        let mut regs: std::vec::Vec<Register> = board
            .register_writes()
            .into_iter()
            .map(|(r, _)| r)
            .collect();
        regs.sort();
        regs.dedup();
        regs
    }

    #[test]
    fn rev1_rtc_sets_sopt1_bit19_and_mcgclksel() {
        let board = SimBoard::new();
        let mut regs = board.registers();
        K60Revision::<1>::select_reference(&mut regs, FllReference::Rtc32k);

        assert_eq!(board.register(Register::SimSopt1) & (1 << 19), 1 << 19);
        assert_eq!(board.register(Register::SimSopt2) & 1, 1);
        assert_eq!(
            written_registers(&board),
            [Register::SimSopt1, Register::SimSopt2],
            "rev 1 must never touch MCG_C7"
        );
        assert_eq!(
            K60Revision::<1>::selected_reference(&mut regs),
            FllReference::Rtc32k
        );
    }

    #[test]
    fn rev2_rtc_writes_osc32ksel_field_and_c7() {
        let board = SimBoard::new();
        let mut regs = board.registers();
        // Pre-set bit 18 to check the two-bit field is replaced, not OR-ed.
        board.preset_register(Register::SimSopt1, 1 << 18);
        K60Revision::<2>::select_reference(&mut regs, FllReference::Rtc32k);

        assert_eq!(board.register(Register::SimSopt1) & (0b11 << 18), 0b10 << 18);
        assert_eq!(board.register(Register::McgC7), 0x01);
        assert_eq!(
            written_registers(&board),
            [Register::SimSopt1, Register::McgC7],
            "rev 2 must never touch SIM_SOPT2.MCGCLKSEL"
        );
        assert_eq!(
            K60Revision::<2>::selected_reference(&mut regs),
            FllReference::Rtc32k
        );
    }

    #[test]
    fn internal_reference_restores_reset_routing() {
        let board = SimBoard::new();
        let mut regs = board.registers();
        K60Revision::<2>::select_reference(&mut regs, FllReference::Rtc32k);
        K60Revision::<2>::select_reference(&mut regs, FllReference::Internal);
        assert_eq!(board.register(Register::McgC7), 0);
        assert_eq!(board.register(Register::SimSopt1) & (0b11 << 18), 0);
        assert_eq!(
            K60Revision::<2>::selected_reference(&mut regs),
            FllReference::Internal
        );
    }

    #[test]
    fn selected_revision_is_one_or_two() {
        assert!(CPU_REVISION == 1 || CPU_REVISION == 2);
    }
}
