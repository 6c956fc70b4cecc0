//! Shared fixtures for the bring-up integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]

use firmware::boot::{init_core, Board, Bringup, Complete};
use firmware::{
    init_onboard_spi, BringupConfig, BringupError, ClockSequencer, PowerRailController,
    SpiBusReady,
};
use platform::board;
use platform::mocks::{
    BoardEvent, SimBoard, SimCore, SimGpio, SimLowPower, SimRegisterFile, SimSpi, SimSpin,
};
use platform::SpinDelay;

/// Board whose collaborators all share `sim`.
pub type SimBoardHandles<D = SimSpin> =
    Board<SimRegisterFile, SimGpio, SimSpi, D, SimCore, SimLowPower>;

/// Install a tracing subscriber once so `RUST_LOG=debug` shows the bring-up log.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn handles(sim: &SimBoard) -> SimBoardHandles {
    handles_with_delay(sim, sim.delay())
}

pub fn handles_with_delay<D: SpinDelay>(sim: &SimBoard, delay: D) -> SimBoardHandles<D> {
    Board {
        registers: sim.registers(),
        gpio: sim.gpio(),
        spi: sim.spi(),
        delay,
        core: sim.core(),
        low_power: sim.lpm(),
    }
}

/// Run the whole sequence against `sim`.
pub fn run(sim: &SimBoard, config: BringupConfig) -> Result<Bringup<Complete>, BringupError> {
    init_tracing();
    Bringup::new(config).run(&mut handles(sim))
}

/// Walk the phases up to an idle, configured SPI0 and hand back its token.
pub fn spi_bus_ready(sim: &SimBoard) -> SpiBusReady {
    let config = BringupConfig::mulle();
    let mut clocks = ClockSequencer::new(sim.registers(), sim.delay());
    let (settled, _) = clocks.run(&config);
    let core = init_core(&mut sim.core(), &settled).unwrap();
    let mut rails = PowerRailController::mulle(sim.gpio()).unwrap();
    let powered = rails.power_peripherals(&core).unwrap();
    init_onboard_spi(&mut sim.gpio(), &mut sim.spi(), &config.spi, &powered).unwrap()
}

/// Index of the first event matching `pred`; fails the test if none does.
pub fn first(events: &[BoardEvent], what: &str, pred: impl FnMut(&BoardEvent) -> bool) -> usize {
    events
        .iter()
        .position(pred)
        .unwrap_or_else(|| panic!("no {what} in the event log"))
}

/// Index of the last event matching `pred`; fails the test if none does.
pub fn last(events: &[BoardEvent], what: &str, pred: impl FnMut(&BoardEvent) -> bool) -> usize {
    events
        .iter()
        .rposition(pred)
        .unwrap_or_else(|| panic!("no {what} in the event log"))
}

/// Radio traffic condensed to `R` (status read), `F` (force-off) and `S`
/// (settle spin), in order.
pub fn radio_script(events: &[BoardEvent], settle_spins: u32) -> String {
    let spi_up = events
        .iter()
        .position(|e| matches!(e, BoardEvent::SpiInit(_)))
        .unwrap_or(0);
    events[spi_up..]
        .iter()
        .filter_map(|e| match e {
            BoardEvent::SpiTransfer {
                device: Some(platform::DeviceId::Radio),
                mosi,
                ..
            } => match mosi.first() {
                Some(0x81) => Some('R'),
                Some(0xC2) => Some('F'),
                _ => Some('?'),
            },
            BoardEvent::Spin(n) if *n == settle_spins => Some('S'),
            BoardEvent::GpioSet(line) if *line == board::RADIO_SLEEP => Some('Z'),
            _ => None,
        })
        .collect()
}
