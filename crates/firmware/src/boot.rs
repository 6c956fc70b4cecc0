//! Mulle bring-up sequence.
//!
//! Initialization order (MUST be respected):
//!   1. LEDs: configure, red on
//!   2. RTC oscillator: start early, it is the FLL reference
//!   3. Clocks: dividers, reference, FEE engage, settle, refresh
//!   4. CPU init, then yellow and green on
//!   5. Power rails: all off, then VPERIPH and AVDD on
//!   6. Trace pins
//!   7. SPI0: SLEEP_TR low, chip selects idle, master init
//!   8. SPI devices: flash deep power-down, radio TRX_OFF + sleep
//!   9. Low-power init
//!  10. LEDs off
//!
//! The sequence runs exactly once. [`Bringup::run`] consumes the
//! [`Bringup<Pending>`] it is called on:
//!
//! ```
//! use firmware::boot::{Board, Bringup, Pending};
//! use platform::{CoreInit, GpioDriver, LowPowerInit, RegisterFile, SpiMaster, SpinDelay};
//!
//! fn run_once<R, G, S, D, C, L>(pending: Bringup<Pending>, board: &mut Board<R, G, S, D, C, L>)
//! where
//!     R: RegisterFile,
//!     G: GpioDriver,
//!     S: SpiMaster,
//!     D: SpinDelay,
//!     C: CoreInit,
//!     L: LowPowerInit,
//! {
//!     let _ = pending.run(board);
//! }
//! ```
//!
//! and returns a [`Bringup<Complete>`], which has no `run`, whatever the board:
//!
//! ```compile_fail,E0599
//! use firmware::boot::{Board, Bringup, Complete};
//! use platform::{CoreInit, GpioDriver, LowPowerInit, RegisterFile, SpiMaster, SpinDelay};
//!
//! fn run_again<R, G, S, D, C, L>(done: Bringup<Complete>, board: &mut Board<R, G, S, D, C, L>)
//! where
//!     R: RegisterFile,
//!     G: GpioDriver,
//!     S: SpiMaster,
//!     D: SpinDelay,
//!     C: CoreInit,
//!     L: LowPowerInit,
//! {
//!     let _ = done.run(board);
//! }
//! ```

use platform::board::{LEDS, LED_GREEN, LED_RED, LED_YELLOW};
use platform::{
    Clocks, CoreInit, GpioDriver, LowPowerInit, Pull, RegisterFile, SpiMaster, SpinDelay,
};

use crate::clock::{ClockSequencer, ClocksSettled};
use crate::config::{BringupConfig, RadioPolicy};
use crate::error::{BringupError, OnLine, Result};
use crate::power::PowerRailController;
use crate::spi_sleep::{init_onboard_spi, RadioConvergenceState, SpiDeviceSleeper};
use crate::trace::TraceGpioInitializer;

/// Ordered list of boot sequence steps, logged as each one starts.
///
/// # Correctness Invariants
///
/// - Dividers are programmed BEFORE the FLL is engaged; the reverse order
///   briefly runs bus and flash at ≈96 MHz.
/// - CPU init runs only after the stabilisation spin.
/// - AVDD and VPERIPH come up after CPU init, away from the clock transition.
/// - No SPI transaction happens before chip selects are idle and the master
///   is configured.
pub const BOOT_SEQUENCE_STEPS: &[&str] = &[
    "LEDs",
    "RTC oscillator",
    "clocks",
    "CPU init",
    "power rails",
    "trace pins",
    "SPI0",
    "SPI device sleep",
    "low-power init",
    "done",
];

/// CPU-dependent initialisation ran on a settled clock.
#[derive(Debug)]
#[must_use]
pub struct CoreReady {
    _private: (),
}

#[cfg(test)]
impl CoreReady {
    pub(crate) fn for_tests() -> Self {
        Self { _private: () }
    }
}

/// Run CPU-dependent initialisation. Requires settled clocks.
pub fn init_core<C: CoreInit>(core: &mut C, _settled: &ClocksSettled) -> Result<CoreReady> {
    core.init_core().map_err(|_| BringupError::Core)?;
    Ok(CoreReady { _private: () })
}

/// Collaborators the sequence drives.
pub struct Board<R, G, S, D, C, L> {
    /// SIM/MCG register access.
    pub registers: R,
    /// GPIO driver.
    pub gpio: G,
    /// SPI0 master.
    pub spi: S,
    /// Calibrated spin.
    pub delay: D,
    /// RTC oscillator and CPU init.
    pub core: C,
    /// Final low-power initialiser.
    pub low_power: L,
}

#[cfg(test)]
impl
    Board<
        platform::mocks::SimRegisterFile,
        platform::mocks::SimGpio,
        platform::mocks::SimSpi,
        platform::mocks::SimSpin,
        platform::mocks::SimCore,
        platform::mocks::SimLowPower,
    >
{
    pub(crate) fn simulated(sim: &platform::mocks::SimBoard) -> Self {
        Self {
            registers: sim.registers(),
            gpio: sim.gpio(),
            spi: sim.spi(),
            delay: sim.delay(),
            core: sim.core(),
            low_power: sim.lpm(),
        }
    }
}

/// What bring-up observed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BringupReport {
    /// Clock tree after the switch, if the MCG mode was decodable.
    pub clocks: Option<Clocks>,
    /// Radio convergence, unless a radio driver owns the transceiver.
    pub radio: Option<RadioConvergenceState>,
    /// Deep Power-Down was sent to the flash.
    pub flash_powered_down: bool,
    /// Trace outputs configured.
    pub trace_pins: usize,
}

/// Not yet run.
#[derive(Debug)]
pub struct Pending;

/// Finished; holds the report.
#[derive(Debug)]
pub struct Complete {
    report: BringupReport,
}

/// The run-once boot sequence.
#[derive(Debug)]
pub struct Bringup<State> {
    config: BringupConfig,
    state: State,
}

impl Bringup<Pending> {
    /// Sequence with `config`.
    pub fn new(config: BringupConfig) -> Self {
        Self {
            config,
            state: Pending,
        }
    }

    /// Run every step in order against `board`.
    pub fn run<R, G, S, D, C, L>(
        self,
        board: &mut Board<R, G, S, D, C, L>,
    ) -> Result<Bringup<Complete>>
    where
        R: RegisterFile,
        G: GpioDriver,
        S: SpiMaster,
        D: SpinDelay,
        C: CoreInit,
        L: LowPowerInit,
    {
        let config = self.config;
        let gpio = &mut board.gpio;

        announce(0);
        for led in LEDS {
            gpio.init_output(led, Pull::None).on_line(led)?;
        }
        gpio.set(LED_RED).on_line(LED_RED)?;

        announce(1);
        board
            .core
            .start_reference_oscillator()
            .map_err(|_| BringupError::Core)?;

        announce(2);
        let mut clocks = ClockSequencer::new(&mut board.registers, &mut board.delay);
        let (settled, derived) = clocks.run(&config);

        announce(3);
        let core = init_core(&mut board.core, &settled)?;
        gpio.set(LED_YELLOW).on_line(LED_YELLOW)?;
        gpio.set(LED_GREEN).on_line(LED_GREEN)?;

        announce(4);
        let mut rails = PowerRailController::mulle(&mut *gpio)?;
        let powered = rails.power_peripherals(&core)?;

        announce(5);
        let trace_pins = TraceGpioInitializer::new(&config.trace_pins).init(gpio)?;

        announce(6);
        let bus = init_onboard_spi(gpio, &mut board.spi, &config.spi, &powered)?;

        announce(7);
        let mut sleeper = SpiDeviceSleeper::new(
            &mut *gpio,
            &mut board.spi,
            &mut board.delay,
            config.radio_settle_spins,
            &bus,
        );
        sleeper.power_down_flash()?;
        let radio = match (config.radio, config.radio_attempt_limit) {
            (RadioPolicy::OwnedByDriver, _) => {
                debug!("radio left to its driver");
                None
            }
            (RadioPolicy::SleepOnBoot, None) => Some(sleeper.sleep_radio()?),
            (RadioPolicy::SleepOnBoot, Some(limit)) => Some(sleeper.sleep_radio_within(limit)?),
        };

        announce(8);
        board
            .low_power
            .init_low_power()
            .map_err(|_| BringupError::LowPower)?;

        for led in LEDS {
            gpio.clear(led).on_line(led)?;
        }
        announce(9);

        Ok(Bringup {
            config,
            state: Complete {
                report: BringupReport {
                    clocks: derived,
                    radio,
                    flash_powered_down: true,
                    trace_pins,
                },
            },
        })
    }
}

impl Bringup<Complete> {
    /// What the sequence observed.
    pub fn report(&self) -> &BringupReport {
        &self.state.report
    }

    /// Configuration the sequence ran with.
    pub fn config(&self) -> &BringupConfig {
        &self.config
    }
}

fn announce(step: usize) {
    if let Some(name) = BOOT_SEQUENCE_STEPS.get(step) {
        info!("boot: {}", *name);
    }
}
