//! Supply rail sequencing.
//!
//! Every rail line is driven low as soon as it is configured, so nothing is
//! powered by accident while the clock is still moving. Rails are only
//! enabled with a [`CoreReady`] in hand, which the boot sequence can produce
//! only after the clocks settled and CPU initialisation ran; switching the
//! analog supply on earlier couples the FLL transition into AVDD readings.
//! No rail is switched off again during bring-up.

use platform::board;
use platform::{GpioDriver, PowerRail, Pull, RailId};

use crate::boot::CoreReady;
use crate::error::{OnLine, Result};

/// VPERIPH and AVDD are up; on-board SPI devices have power.
#[derive(Debug)]
#[must_use]
pub struct RailsPowered {
    _private: (),
}

/// Owns the enable lines of `N` supply rails.
pub struct PowerRailController<G, const N: usize> {
    gpio: G,
    rails: [(PowerRail, bool); N],
}

impl<G: GpioDriver> PowerRailController<G, 3> {
    /// Controller for the Mulle rails (AVDD, VPERIPH, VSEC).
    pub fn mulle(gpio: G) -> Result<Self> {
        Self::init(gpio, board::RAILS)
    }
}

impl<G: GpioDriver, const N: usize> PowerRailController<G, N> {
    /// Configure every rail line as an output and drive it inactive.
    pub fn init(mut gpio: G, rails: [PowerRail; N]) -> Result<Self> {
        for rail in &rails {
            gpio.init_output(rail.enable, Pull::None).on_line(rail.enable)?;
        }
        for rail in &rails {
            gpio.clear(rail.enable).on_line(rail.enable)?;
        }
        Ok(Self {
            gpio,
            rails: rails.map(|rail| (rail, false)),
        })
    }

    /// Drive `rail` to its active (high) level.
    ///
    /// Rails this controller does not own are ignored with a warning.
    pub fn enable(&mut self, rail: RailId, _core: &CoreReady) -> Result<()> {
        let Some((power, enabled)) = self.rails.iter_mut().find(|(r, _)| r.id == rail) else {
            warn!("rail {:?} is not managed here", rail);
            return Ok(());
        };
        self.gpio.set(power.enable).on_line(power.enable)?;
        *enabled = true;
        debug!("rail {:?} on ({})", rail, power.enable);
        Ok(())
    }

    /// Whether `rail` has been enabled.
    pub fn is_enabled(&self, rail: RailId) -> bool {
        self.rails.iter().any(|(r, on)| r.id == rail && *on)
    }

    /// Enable VPERIPH, then AVDD. VSEC stays off.
    pub fn power_peripherals(&mut self, core: &CoreReady) -> Result<RailsPowered> {
        self.enable(RailId::Vperiph, core)?;
        self.enable(RailId::Avdd, core)?;
        info!("peripheral rails on");
        Ok(RailsPowered { _private: () })
    }
}
