//! Register-access capability for the clock and mode-select registers.
//!
//! Boot code never dereferences a peripheral address directly. It talks to a
//! [`RegisterFile`], addressed by [`Register`] and [`Field`], so the same
//! sequencing code runs against:
//!
//! - [`crate::kinetis::KinetisClockRegisters`]: the memory-mapped SIM and MCG
//!   blocks of the K60, and
//! - `mocks::SimRegisterFile`: a simulated register file that records every
//!   write for host tests.
//!
//! # Field layout (K60 Sub-Family Reference Manual, chapters 12 and 24)
//!
//! | Register      | Field      | Bits  |
//! |---------------|------------|-------|
//! | `SIM_SOPT1`   | OSC32KSEL  | 19 (rev 1) / 19:18 (rev 2) |
//! | `SIM_SOPT2`   | PLLFLLSEL  | 16    |
//! | `SIM_SOPT2`   | MCGCLKSEL  | 0 (rev 1 only) |
//! | `SIM_CLKDIV1` | OUTDIV1..4 | 31:28, 27:24, 23:20, 19:16 |
//! | `MCG_C1`      | CLKS/FRDIV/IREFS | 7:6, 5:3, 2 |
//! | `MCG_C4`      | DMX32/DRST_DRS | 7, 6:5 |
//! | `MCG_S`       | IREFST/CLKST | 4, 3:2 |
//! | `MCG_C7`      | OSCSEL     | 0 (rev 2 only) |

/// Registers reachable through a [`RegisterFile`].
///
/// MCG registers are 8 bits wide on silicon; they are carried as `u32` here
/// and truncated by the memory-mapped backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// System options register 1 (32 kHz oscillator select).
    SimSopt1,
    /// System options register 2 (PLL/FLL select, rev 1 MCG clock select).
    SimSopt2,
    /// System clock divider register 1.
    SimClkdiv1,
    /// MCG control 1 (clock source, FLL reference divider, internal ref select).
    McgC1,
    /// MCG control 2 (oscillator range, low power select).
    McgC2,
    /// MCG control 4 (DCO range and trims).
    McgC4,
    /// MCG control 6 (PLL select).
    McgC6,
    /// MCG status.
    McgS,
    /// MCG control 7 (oscillator select, rev 2 only).
    McgC7,
}

impl Register {
    /// Every register in declaration order.
    pub const ALL: [Register; 9] = [
        Register::SimSopt1,
        Register::SimSopt2,
        Register::SimClkdiv1,
        Register::McgC1,
        Register::McgC2,
        Register::McgC4,
        Register::McgC6,
        Register::McgS,
        Register::McgC7,
    ];

    /// Value after power-on reset.
    pub const fn reset_value(self) -> u32 {
        match self {
            Register::SimSopt1 => 0x8000_0000,
            Register::SimSopt2 => 0x0000_1000,
            Register::SimClkdiv1 => 0x0001_0000,
            Register::McgC1 => 0x04,
            Register::McgC2 => 0x80,
            Register::McgC4 => 0x00,
            Register::McgC6 => 0x00,
            Register::McgS => 0x10,
            Register::McgC7 => 0x00,
        }
    }

    /// Short datasheet name.
    pub const fn name(self) -> &'static str {
        match self {
            Register::SimSopt1 => "SIM_SOPT1",
            Register::SimSopt2 => "SIM_SOPT2",
            Register::SimClkdiv1 => "SIM_CLKDIV1",
            Register::McgC1 => "MCG_C1",
            Register::McgC2 => "MCG_C2",
            Register::McgC4 => "MCG_C4",
            Register::McgC6 => "MCG_C6",
            Register::McgS => "MCG_S",
            Register::McgC7 => "MCG_C7",
        }
    }
}

impl core::fmt::Display for Register {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// A contiguous bit field inside a [`Register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Field {
    /// Register holding the field.
    pub register: Register,
    /// Bit position of the least significant bit.
    pub shift: u8,
    /// Width in bits (1..=32).
    pub width: u8,
}

impl Field {
    /// Define a field.
    ///
    /// # Panics
    ///
    /// If `width` is zero or `shift + width` exceeds 32. Fields are board
    /// constants, so this fails at compile time.
    pub const fn new(register: Register, shift: u8, width: u8) -> Self {
        assert!(width >= 1 && (shift as u32).saturating_add(width as u32) <= 32);
        Self {
            register,
            shift,
            width,
        }
    }

    /// Unshifted all-ones value for this field.
    pub const fn max_value(self) -> u32 {
        u32::MAX.wrapping_shr(32u32.saturating_sub(self.width as u32))
    }

    /// In-register mask.
    pub const fn mask(self) -> u32 {
        self.max_value().wrapping_shl(self.shift as u32)
    }

    /// Place `value` at this field's position, dropping bits that do not fit.
    pub const fn encode(self, value: u32) -> u32 {
        (value & self.max_value()).wrapping_shl(self.shift as u32)
    }

    /// Extract this field from a full register value.
    pub const fn decode(self, register_value: u32) -> u32 {
        register_value.wrapping_shr(self.shift as u32) & self.max_value()
    }
}

/// Register-access capability.
///
/// Implementors provide raw `read`/`write`; field helpers are derived from
/// those two so every backend gets identical read-modify-write semantics.
pub trait RegisterFile {
    /// Read a whole register.
    fn read(&mut self, register: Register) -> u32;

    /// Write a whole register.
    fn write(&mut self, register: Register, value: u32);

    /// Read-modify-write a whole register.
    fn modify(&mut self, register: Register, f: impl FnOnce(u32) -> u32) {
        let value = self.read(register);
        self.write(register, f(value));
    }

    /// Read one field.
    fn read_field(&mut self, field: Field) -> u32 {
        field.decode(self.read(field.register))
    }

    /// Replace one field, leaving the rest of the register untouched.
    fn write_field(&mut self, field: Field, value: u32) {
        self.modify(field.register, |r| (r & !field.mask()) | field.encode(value));
    }

    /// Set every bit of `field`.
    fn set_field(&mut self, field: Field) {
        self.modify(field.register, |r| r | field.mask());
    }

    /// Clear every bit of `field`.
    fn clear_field(&mut self, field: Field) {
        self.modify(field.register, |r| r & !field.mask());
    }
}

impl<T: RegisterFile + ?Sized> RegisterFile for &mut T {
    fn read(&mut self, register: Register) -> u32 {
        (**self).read(register)
    }

    fn write(&mut self, register: Register, value: u32) {
        (**self).write(register, value);
    }
}

// ── SIM fields ───────────────────────────────────────────────────────────────

/// `SIM_SOPT1.OSC32KSEL`, rev 1 encoding: one bit, set = RTC 32 kHz oscillator.
pub const SIM_SOPT1_OSC32KSEL_REV1: Field = Field::new(Register::SimSopt1, 19, 1);
/// `SIM_SOPT1.OSC32KSEL`, rev 2 encoding: two bits, `0b10` = RTC 32 kHz oscillator.
pub const SIM_SOPT1_OSC32KSEL_REV2: Field = Field::new(Register::SimSopt1, 18, 2);
/// `SIM_SOPT2.PLLFLLSEL`: clear = FLL clock feeds peripherals.
pub const SIM_SOPT2_PLLFLLSEL: Field = Field::new(Register::SimSopt2, 16, 1);
/// `SIM_SOPT2.MCGCLKSEL` (rev 1 only): set = MCG external reference is the RTC oscillator.
pub const SIM_SOPT2_MCGCLKSEL: Field = Field::new(Register::SimSopt2, 0, 1);

/// `SIM_CLKDIV1.OUTDIV1`: core/system clock divider minus one.
pub const SIM_CLKDIV1_OUTDIV1: Field = Field::new(Register::SimClkdiv1, 28, 4);
/// `SIM_CLKDIV1.OUTDIV2`: bus clock divider minus one.
pub const SIM_CLKDIV1_OUTDIV2: Field = Field::new(Register::SimClkdiv1, 24, 4);
/// `SIM_CLKDIV1.OUTDIV3`: FlexBus clock divider minus one.
pub const SIM_CLKDIV1_OUTDIV3: Field = Field::new(Register::SimClkdiv1, 20, 4);
/// `SIM_CLKDIV1.OUTDIV4`: flash clock divider minus one.
pub const SIM_CLKDIV1_OUTDIV4: Field = Field::new(Register::SimClkdiv1, 16, 4);

// ── MCG fields ───────────────────────────────────────────────────────────────

/// `MCG_C1.CLKS`: MCGOUTCLK source (0 = FLL/PLL, 1 = internal ref, 2 = external ref).
pub const MCG_C1_CLKS: Field = Field::new(Register::McgC1, 6, 2);
/// `MCG_C1.FRDIV`: FLL external reference divider.
pub const MCG_C1_FRDIV: Field = Field::new(Register::McgC1, 3, 3);
/// `MCG_C1.IREFS`: set = slow internal reference feeds the FLL.
pub const MCG_C1_IREFS: Field = Field::new(Register::McgC1, 2, 1);
/// `MCG_C2.RANGE0`: oscillator frequency range.
pub const MCG_C2_RANGE0: Field = Field::new(Register::McgC2, 4, 2);
/// `MCG_C2.LP`: low power select (FLL disabled in bypass modes).
pub const MCG_C2_LP: Field = Field::new(Register::McgC2, 1, 1);
/// `MCG_C4.DMX32`: DCO tuned for a 32.768 kHz reference.
pub const MCG_C4_DMX32: Field = Field::new(Register::McgC4, 7, 1);
/// `MCG_C4.DRST_DRS`: DCO range select.
pub const MCG_C4_DRST_DRS: Field = Field::new(Register::McgC4, 5, 2);
/// `MCG_C6.PLLS`: set = PLL selected instead of FLL.
pub const MCG_C6_PLLS: Field = Field::new(Register::McgC6, 6, 1);
/// `MCG_S.PLLST`: PLL select status.
pub const MCG_S_PLLST: Field = Field::new(Register::McgS, 5, 1);
/// `MCG_S.IREFST`: internal reference status.
pub const MCG_S_IREFST: Field = Field::new(Register::McgS, 4, 1);
/// `MCG_S.CLKST`: clock mode status, mirrors `MCG_C1.CLKS` once switched.
pub const MCG_S_CLKST: Field = Field::new(Register::McgS, 2, 2);
/// `MCG_C7.OSCSEL` (rev 2 only): set = MCG external reference is the RTC oscillator.
pub const MCG_C7_OSCSEL: Field = Field::new(Register::McgC7, 0, 1);

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    struct Flat([u32; 9]);

    impl RegisterFile for Flat {
        fn read(&mut self, register: Register) -> u32 {
            let idx = Register::ALL.iter().position(|r| *r == register).unwrap();
            self.0[idx]
        }

        fn write(&mut self, register: Register, value: u32) {
            let idx = Register::ALL.iter().position(|r| *r == register).unwrap();
            self.0[idx] = value;
        }
    }

    #[test]
    fn field_masks_cover_edge_widths() {
        let bit = Field::new(Register::McgC1, 0, 1);
        let word = Field::new(Register::SimClkdiv1, 0, 32);
        let top = Field::new(Register::SimClkdiv1, 31, 1);
        assert_eq!(bit.max_value(), 1);
        assert_eq!(word.max_value(), u32::MAX);
        assert_eq!(word.mask(), u32::MAX);
        assert_eq!(top.mask(), 0x8000_0000);
        assert_eq!(top.encode(3), 0x8000_0000);
        assert_eq!(top.decode(0x8000_0000), 1);
        assert_eq!(MCG_C4_DRST_DRS.decode(0xFF), 0b11);
    }

    #[test]
    fn clkdiv1_fields_tile_the_upper_half_word() {
        let all = SIM_CLKDIV1_OUTDIV1.mask()
            | SIM_CLKDIV1_OUTDIV2.mask()
            | SIM_CLKDIV1_OUTDIV3.mask()
            | SIM_CLKDIV1_OUTDIV4.mask();
        assert_eq!(all, 0xFFFF_0000);
    }

    #[test]
    fn osc32ksel_encodings_overlap_on_bit_19() {
        assert_eq!(SIM_SOPT1_OSC32KSEL_REV1.mask(), 1 << 19);
        assert_eq!(SIM_SOPT1_OSC32KSEL_REV2.mask(), 0b11 << 18);
        assert_eq!(SIM_SOPT1_OSC32KSEL_REV2.encode(2), 1 << 19);
    }

    #[test]
    fn write_field_preserves_neighbouring_bits() {
        let mut regs = Flat([0; 9]);
        regs.write(Register::McgC1, 0xFF);
        regs.write_field(MCG_C1_CLKS, 0);
        assert_eq!(regs.read(Register::McgC1), 0x3F);
        regs.clear_field(MCG_C1_IREFS);
        assert_eq!(regs.read(Register::McgC1), 0x3B);
        regs.set_field(MCG_C1_IREFS);
        assert_eq!(regs.read_field(MCG_C1_IREFS), 1);
    }

    #[test]
    fn encode_truncates_oversized_values() {
        assert_eq!(MCG_C1_CLKS.encode(0b111), 0b11 << 6);
        assert_eq!(MCG_C1_CLKS.decode(0xC0), 0b11);
    }
}
