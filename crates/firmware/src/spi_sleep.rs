//! Putting the SPI0 devices to sleep.
//!
//! The radio, accelerometer, NVRAM and NOR flash share SPI0 and are told
//! apart only by their active-low chip selects. Every transaction here
//! asserts exactly one chip select, clocks one opcode byte plus an optional
//! data or filler byte, and deasserts it again before anything else touches
//! the bus, including when the transfer itself fails.
//!
//! # Radio convergence
//!
//! The AT86RF231 only accepts SLEEP_TR from `TRX_OFF`, and right after power
//! up it may still be walking through its state machine. The loop is:
//!
//! ```text
//! loop {
//!     status = read TRX_STATUS          // 0x81 0x00 → _, status
//!     if status == TRX_OFF { break }
//!     write TRX_STATE = FORCE_TRX_OFF   // 0xC2 0x03
//!     spin RADIO_SETTLE_SPINS
//! }
//! assert SLEEP_TR
//! ```
//!
//! A radio that never reaches `TRX_OFF` keeps the loop running forever; boot
//! does not continue without it. [`SpiDeviceSleeper::sleep_radio_within`]
//! bounds the loop for test harnesses only.

use core::num::NonZeroU32;

use embedded_hal::spi::{Error as _, SpiBus};
use platform::board;
use platform::devices::{at86rf231, FLASH_DEEP_POWER_DOWN};
use platform::{GpioDriver, Pull, SpiConfig, SpiDevice, SpiMaster, SpinDelay};

use crate::error::{BringupError, OnLine, Result};
use crate::power::RailsPowered;

/// Chip selects are idle, SLEEP_TR is low and the SPI master is configured.
#[derive(Debug)]
#[must_use]
pub struct SpiBusReady {
    _private: (),
}

/// Prepare SPI0 for the on-board devices.
///
/// Each chip select is latched high before its pin becomes an output, so no
/// device sees a select pulse while the bus is being set up.
pub fn init_onboard_spi<G, S>(
    gpio: &mut G,
    spi: &mut S,
    config: &SpiConfig,
    _rails: &RailsPowered,
) -> Result<SpiBusReady>
where
    G: GpioDriver,
    S: SpiMaster,
{
    gpio.init_output(board::RADIO_SLEEP, Pull::None)
        .on_line(board::RADIO_SLEEP)?;
    gpio.clear(board::RADIO_SLEEP).on_line(board::RADIO_SLEEP)?;

    for device in board::SPI0_DEVICES {
        gpio.set(device.cs).on_line(device.cs)?;
        gpio.init_output(device.cs, Pull::None).on_line(device.cs)?;
    }

    spi.init_master(config)
        .map_err(|e| BringupError::SpiInit { kind: e.kind() })?;
    info!("SPI0 master at {} Hz", config.frequency);
    Ok(SpiBusReady { _private: () })
}

/// Outcome of driving the radio to `TRX_OFF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RadioConvergenceState {
    /// Status the loop waits for.
    pub target: u8,
    /// Most recent `TRX_STATUS` value.
    pub last_status: u8,
    /// `TRX_STATUS` reads performed.
    pub status_reads: u32,
    /// `FORCE_TRX_OFF` commands issued.
    pub force_off_commands: u32,
}

impl RadioConvergenceState {
    fn new() -> Self {
        Self {
            target: at86rf231::STATUS_TRX_OFF,
            last_status: 0,
            status_reads: 0,
            force_off_commands: 0,
        }
    }

    fn record_read(&mut self, status: u8) {
        self.last_status = status;
        self.status_reads = self.status_reads.saturating_add(1);
    }

    /// Whether the last read returned the target status.
    pub fn settled(&self) -> bool {
        self.status_reads > 0 && self.last_status == self.target
    }
}

/// Issues the power-down handshakes on SPI0.
pub struct SpiDeviceSleeper<G, S, D> {
    gpio: G,
    spi: S,
    delay: D,
    settle_spins: u32,
}

impl<G, S, D> SpiDeviceSleeper<G, S, D>
where
    G: GpioDriver,
    S: SpiBus<u8>,
    D: SpinDelay,
{
    /// Sleeper spinning `settle_spins` between radio force-off attempts.
    pub fn new(gpio: G, spi: S, delay: D, settle_spins: u32, _bus: &SpiBusReady) -> Self {
        Self {
            gpio,
            spi,
            delay,
            settle_spins,
        }
    }

    /// Send Deep Power-Down to the NOR flash. Nothing comes back.
    pub fn power_down_flash(&mut self) -> Result<()> {
        self.with_chip_select(board::FLASH, |spi| spi.write(&[FLASH_DEEP_POWER_DOWN]))?;
        info!("flash in deep power-down");
        Ok(())
    }

    /// Drive the radio to `TRX_OFF`, then assert SLEEP_TR.
    ///
    /// Does not return until the radio reports `TRX_OFF`.
    pub fn sleep_radio(&mut self) -> Result<RadioConvergenceState> {
        self.converge_and_sleep(None)
    }

    /// [`Self::sleep_radio`], giving up after `max_reads` status reads.
    ///
    /// Test instrumentation: lets a harness exercise an unresponsive radio
    /// without hanging. Firmware calls [`Self::sleep_radio`].
    pub fn sleep_radio_within(&mut self, max_reads: NonZeroU32) -> Result<RadioConvergenceState> {
        self.converge_and_sleep(Some(max_reads))
    }

    fn converge_and_sleep(&mut self, limit: Option<NonZeroU32>) -> Result<RadioConvergenceState> {
        let state = self.force_radio_off(limit)?;
        self.gpio
            .set(board::RADIO_SLEEP)
            .on_line(board::RADIO_SLEEP)?;
        info!(
            "radio asleep after {} reads, {} force-off",
            state.status_reads, state.force_off_commands
        );
        Ok(state)
    }

    fn force_radio_off(&mut self, limit: Option<NonZeroU32>) -> Result<RadioConvergenceState> {
        let mut state = RadioConvergenceState::new();
        loop {
            let status = self.read_radio_register(at86rf231::READ_TRX_STATUS)?;
            state.record_read(status);
            if state.settled() {
                return Ok(state);
            }
            debug!("radio status {:#x}, forcing TRX_OFF", status);

            if let Some(max) = limit {
                if state.status_reads >= max.get() {
                    return Err(BringupError::RadioNotSettled {
                        last_status: status,
                        attempts: state.status_reads,
                    });
                }
            }

            self.write_radio_register(at86rf231::WRITE_TRX_STATE, at86rf231::CMD_FORCE_TRX_OFF)?;
            state.force_off_commands = state.force_off_commands.saturating_add(1);
            self.delay.spin(self.settle_spins);
        }
    }

    fn read_radio_register(&mut self, opcode: u8) -> Result<u8> {
        let mut frame = [opcode, at86rf231::FILLER];
        self.with_chip_select(board::RADIO, |spi| spi.transfer_in_place(&mut frame))?;
        let [_, value] = frame;
        Ok(value)
    }

    fn write_radio_register(&mut self, opcode: u8, value: u8) -> Result<()> {
        let mut frame = [opcode, value];
        self.with_chip_select(board::RADIO, |spi| spi.transfer_in_place(&mut frame))
    }

    /// Run `op` with `device` selected. The chip select is released even
    /// when `op` fails.
    fn with_chip_select<T>(
        &mut self,
        device: SpiDevice,
        op: impl FnOnce(&mut S) -> core::result::Result<T, S::Error>,
    ) -> Result<T> {
        self.gpio.clear(device.cs).on_line(device.cs)?;
        let outcome = op(&mut self.spi).and_then(|value| self.spi.flush().map(|()| value));
        let released = self.gpio.set(device.cs).on_line(device.cs);
        let value = match outcome {
            Ok(value) => value,
            Err(e) => {
                if released.is_err() {
                    error!("{:?} may still be selected: {} not released", device.id, device.cs);
                }
                return Err(BringupError::Spi {
                    device: device.id,
                    kind: e.kind(),
                });
            }
        };
        released?;
        Ok(value)
    }
}
