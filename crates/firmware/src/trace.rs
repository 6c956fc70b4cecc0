//! Low-power trace outputs.
//!
//! The low-power code toggles these pins so mode transitions show up on a
//! logic analyser. Which ones exist is a build choice (`trace-*` features);
//! bring-up only makes the selected ones outputs.

use platform::{GpioDriver, Line, Pull};

use crate::error::{OnLine, Result};

/// Configures the trace outputs compiled into this build.
pub struct TraceGpioInitializer<'a> {
    pins: &'a [Line],
}

impl<'a> TraceGpioInitializer<'a> {
    /// Initializer for `pins`.
    pub fn new(pins: &'a [Line]) -> Self {
        Self { pins }
    }

    /// Make every pin an output without pull. Returns how many were configured.
    pub fn init<G: GpioDriver>(&self, gpio: &mut G) -> Result<usize> {
        for &pin in self.pins {
            gpio.init_output(pin, Pull::None).on_line(pin)?;
        }
        if !self.pins.is_empty() {
            debug!("{} trace pins configured", self.pins.len());
        }
        Ok(self.pins.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use platform::board::trace;
    use platform::mocks::{BoardEvent, SimBoard};

    #[test]
    fn no_pins_is_a_no_op() {
        let board = SimBoard::new();
        let n = TraceGpioInitializer::new(&[]).init(&mut board.gpio()).unwrap();
        assert_eq!(n, 0);
        assert!(board.events().is_empty());
    }

    #[test]
    fn selected_pins_become_plain_outputs() {
        let board = SimBoard::new();
        let pins = [trace::WAIT, trace::LLS];
        let n = TraceGpioInitializer::new(&pins)
            .init(&mut board.gpio())
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(
            board.events(),
            [
                BoardEvent::GpioInit {
                    line: trace::WAIT,
                    pull: Pull::None
                },
                BoardEvent::GpioInit {
                    line: trace::LLS,
                    pull: Pull::None
                },
            ]
        );
    }
}
