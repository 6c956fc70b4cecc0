//! GPIO abstraction layer
//!
//! Bring-up drives every line through one [`GpioDriver`] addressed by
//! [`Line`], the Kinetis `(port, pin)` pair. All lines the board controls are
//! push-pull outputs; inputs and interrupts are left to later drivers.

/// Kinetis GPIO port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    /// PTA
    A = 0,
    /// PTB
    B = 1,
    /// PTC
    C = 2,
    /// PTD
    D = 3,
    /// PTE
    E = 4,
}

impl Port {
    /// Port letter, for logs.
    pub const fn letter(self) -> char {
        match self {
            Port::A => 'A',
            Port::B => 'B',
            Port::C => 'C',
            Port::D => 'D',
            Port::E => 'E',
        }
    }
}

/// One GPIO line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Line {
    /// Port the line belongs to.
    pub port: Port,
    /// Pin number within the port (0..=31).
    pub pin: u8,
}

impl Line {
    /// Line `PT<port><pin>`.
    ///
    /// # Panics
    ///
    /// If `pin` is 32 or above. Lines are board constants, so this fails at
    /// compile time.
    pub const fn new(port: Port, pin: u8) -> Self {
        assert!(pin < 32);
        Self { port, pin }
    }

    /// Single-bit mask of this line in its port's data registers.
    pub const fn mask(self) -> u32 {
        1u32.wrapping_shl(self.pin as u32)
    }
}

impl core::fmt::Display for Line {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "PT{}{}", self.port.letter(), self.pin)
    }
}

/// Pull resistor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    /// Floating (no pull resistor)
    #[default]
    None,
    /// Pull-up
    Up,
    /// Pull-down
    Down,
}

/// Generic GPIO driver: configure, set, clear.
pub trait GpioDriver {
    /// Error type
    type Error: core::fmt::Debug;

    /// Configure `line` as a push-pull output. The output level is left as
    /// the data register holds it; callers drive it explicitly afterwards.
    fn init_output(&mut self, line: Line, pull: Pull) -> Result<(), Self::Error>;

    /// Drive `line` high.
    fn set(&mut self, line: Line) -> Result<(), Self::Error>;

    /// Drive `line` low.
    fn clear(&mut self, line: Line) -> Result<(), Self::Error>;
}

impl<T: GpioDriver + ?Sized> GpioDriver for &mut T {
    type Error = T::Error;

    fn init_output(&mut self, line: Line, pull: Pull) -> Result<(), Self::Error> {
        (**self).init_output(line, pull)
    }

    fn set(&mut self, line: Line) -> Result<(), Self::Error> {
        (**self).set(line)
    }

    fn clear(&mut self, line: Line) -> Result<(), Self::Error> {
        (**self).clear(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_display_uses_kinetis_names() {
        assert_eq!(std::format!("{}", Line::new(Port::D, 4)), "PTD4");
        assert_eq!(std::format!("{}", Line::new(Port::C, 15)), "PTC15");
    }

    #[test]
    fn line_mask_is_one_bit() {
        assert_eq!(Line::new(Port::B, 17).mask(), 1 << 17);
    }
}
