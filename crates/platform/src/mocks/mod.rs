//! Simulated Mulle board for host tests.
//!
//! [`SimBoard`] owns one shared [`BoardState`]; every collaborator handle it
//! hands out ([`SimRegisterFile`], [`SimGpio`], [`SimSpi`], [`SimSpin`],
//! [`SimCore`], [`SimLowPower`]) appends to the same ordered [`BoardEvent`]
//! log, so a test can assert on the relative order of register writes, GPIO
//! changes, SPI transactions and spins across subsystems.
//!
//! The SPI bus answers as the device whose chip select is asserted: an
//! AT86RF231 model ([`SimRadio`]) and a NOR flash model. A chip select counts
//! as asserted only once its line is configured as an output and driven low.
//! Whenever more than one is asserted at the same time the offending set is
//! recorded in [`SimBoard::bus_violations`].

#![cfg(any(test, feature = "std"))]

use core::cell::RefCell;
use core::convert::Infallible;

use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::spi::{ErrorKind, ErrorType, SpiBus};

use crate::board;
use crate::delay::SpinDelay;
use crate::devices::{at86rf231, DeviceId, FLASH_DEEP_POWER_DOWN};
use crate::gpio::{GpioDriver, Line, Pull};
use crate::peripheral::{SpiConfig, SpiMaster};
use crate::power::{CoreInit, LowPowerInit};
use crate::registers::{
    Register, RegisterFile, MCG_C1_CLKS, MCG_C1_IREFS, MCG_C6_PLLS, MCG_S_CLKST, MCG_S_IREFST,
    MCG_S_PLLST,
};

/// One observable action on the simulated board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    /// A register was written through a [`RegisterFile`].
    RegisterWrite {
        /// Target register.
        register: Register,
        /// Full value written.
        value: u32,
    },
    /// A line was configured as an output.
    GpioInit {
        /// Line.
        line: Line,
        /// Pull configuration.
        pull: Pull,
    },
    /// A line was driven high.
    GpioSet(Line),
    /// A line was driven low.
    GpioClear(Line),
    /// The SPI master was initialised.
    SpiInit(SpiConfig),
    /// One SPI bus call.
    SpiTransfer {
        /// Device whose chip select was asserted, if exactly one was.
        device: Option<DeviceId>,
        /// Bytes clocked out.
        mosi: Vec<u8>,
        /// Bytes clocked in.
        miso: Vec<u8>,
    },
    /// A calibrated spin.
    Spin(u32),
    /// The RTC oscillator was started.
    ReferenceOscillatorStarted,
    /// CPU-dependent initialisation ran.
    CoreInitialized,
    /// The low-power subsystem was initialised.
    LowPowerInitialized,
}

/// AT86RF231 model.
///
/// Every `TRX_STATUS` read pops the next queued status; once the queue is
/// empty reads return the fallback status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimRadio {
    statuses: VecDeque<u8>,
    fallback: u8,
    status_reads: usize,
    force_off_commands: usize,
    last_status: Option<u8>,
}

impl SimRadio {
    /// Already idle in `TRX_OFF`.
    pub fn settled() -> Self {
        Self::with_statuses([])
    }

    /// Reports `RX_ON` for the first `k` status reads, then `TRX_OFF`.
    pub fn settling_after(k: usize) -> Self {
        Self::with_statuses(core::iter::repeat(at86rf231::STATUS_RX_ON).take(k))
    }

    /// Reports `statuses` in order, then `TRX_OFF`.
    pub fn with_statuses(statuses: impl IntoIterator<Item = u8>) -> Self {
        Self {
            statuses: statuses.into_iter().collect(),
            fallback: at86rf231::STATUS_TRX_OFF,
            status_reads: 0,
            force_off_commands: 0,
            last_status: None,
        }
    }

    /// Never leaves the transition state, like a transceiver held in reset.
    pub fn unresponsive() -> Self {
        Self {
            fallback: at86rf231::STATUS_TRANSITION_IN_PROGRESS,
            ..Self::settled()
        }
    }

    /// `TRX_STATUS` reads served so far.
    pub fn status_reads(&self) -> usize {
        self.status_reads
    }

    /// `FORCE_TRX_OFF` commands received so far.
    pub fn force_off_commands(&self) -> usize {
        self.force_off_commands
    }

    /// Status returned by the most recent read.
    pub fn last_status(&self) -> Option<u8> {
        self.last_status
    }

    fn respond(&mut self, frame: &[u8], index: usize, byte: u8) -> u8 {
        match (frame.first().copied(), index) {
            // First byte out of the AT86RF231 is PHY_STATUS; the model keeps it zero.
            (_, 0) => 0x00,
            (Some(at86rf231::READ_TRX_STATUS), 1) => {
                let status = self.statuses.pop_front().unwrap_or(self.fallback);
                self.status_reads = self.status_reads.saturating_add(1);
                self.last_status = Some(status);
                status
            }
            (Some(at86rf231::WRITE_TRX_STATE), 1) => {
                if byte == at86rf231::CMD_FORCE_TRX_OFF {
                    self.force_off_commands = self.force_off_commands.saturating_add(1);
                }
                0x00
            }
            _ => 0x00,
        }
    }
}

impl Default for SimRadio {
    fn default() -> Self {
        Self::settled()
    }
}

/// NOR flash model: only tracks Deep Power-Down.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimFlash {
    deep_power_down_commands: usize,
}

impl SimFlash {
    /// Deep Power-Down commands received so far.
    pub fn deep_power_down_commands(&self) -> usize {
        self.deep_power_down_commands
    }

    fn respond(&mut self, index: usize, byte: u8) -> u8 {
        if index == 0 && byte == FLASH_DEEP_POWER_DOWN {
            self.deep_power_down_commands = self.deep_power_down_commands.saturating_add(1);
        }
        0xFF
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LineState {
    output: bool,
    high: bool,
}

/// State shared by every handle of one [`SimBoard`].
#[derive(Debug)]
pub struct BoardState {
    registers: BTreeMap<Register, u32>,
    lines: BTreeMap<Line, LineState>,
    events: Vec<BoardEvent>,
    spi_config: Option<SpiConfig>,
    frame: Vec<u8>,
    radio: SimRadio,
    flash: SimFlash,
    violations: Vec<Vec<DeviceId>>,
    failing_line: Option<Line>,
    failing_spi: bool,
}

impl BoardState {
    fn new() -> Self {
        Self {
            registers: Register::ALL
                .iter()
                .map(|r| (*r, r.reset_value()))
                .collect(),
            lines: BTreeMap::new(),
            events: Vec::new(),
            spi_config: None,
            frame: Vec::new(),
            radio: SimRadio::default(),
            flash: SimFlash::default(),
            violations: Vec::new(),
            failing_line: None,
            failing_spi: false,
        }
    }

    fn line(&self, line: Line) -> LineState {
        self.lines.get(&line).copied().unwrap_or_default()
    }

    fn asserted_devices(&self) -> Vec<DeviceId> {
        board::SPI0_DEVICES
            .iter()
            .filter(|d| {
                let s = self.line(d.cs);
                s.output && !s.high
            })
            .map(|d| d.id)
            .collect()
    }

    fn check_exclusive(&mut self) {
        let asserted = self.asserted_devices();
        if asserted.len() > 1 {
            self.violations.push(asserted);
        }
    }

    fn update_line(&mut self, line: Line, f: impl FnOnce(&mut LineState)) {
        let was_asserted = self.asserted_devices();
        f(self.lines.entry(line).or_default());
        let now_asserted = self.asserted_devices();
        if now_asserted.iter().any(|d| !was_asserted.contains(d)) {
            self.frame.clear();
        }
        self.check_exclusive();
    }

    fn read_register(&self, register: Register) -> u32 {
        self.registers
            .get(&register)
            .copied()
            .unwrap_or_else(|| register.reset_value())
    }

    /// Make `MCG_S` follow `C1`/`C6` the way silicon does once the switch settles.
    fn sync_mcg_status(&mut self) {
        let c1 = self.read_register(Register::McgC1);
        let c6 = self.read_register(Register::McgC6);
        let plls = MCG_C6_PLLS.decode(c6);
        let clkst = match MCG_C1_CLKS.decode(c1) {
            0 if plls == 1 => 3,
            clks => clks,
        };
        let mut s = self.read_register(Register::McgS);
        s = (s & !MCG_S_IREFST.mask()) | MCG_S_IREFST.encode(MCG_C1_IREFS.decode(c1));
        s = (s & !MCG_S_CLKST.mask()) | MCG_S_CLKST.encode(clkst);
        s = (s & !MCG_S_PLLST.mask()) | MCG_S_PLLST.encode(plls);
        self.registers.insert(Register::McgS, s);
    }

    fn exchange(&mut self, mosi: &[u8]) -> Vec<u8> {
        let asserted = self.asserted_devices();
        let device = match asserted.as_slice() {
            [only] => Some(*only),
            _ => None,
        };
        if asserted.len() > 1 {
            self.violations.push(asserted);
        }

        let mut miso = Vec::with_capacity(mosi.len());
        for &byte in mosi {
            let index = self.frame.len();
            self.frame.push(byte);
            let reply = match device {
                Some(DeviceId::Radio) => self.radio.respond(&self.frame, index, byte),
                Some(DeviceId::Flash) => self.flash.respond(index, byte),
                _ => 0xFF,
            };
            miso.push(reply);
        }
        self.events.push(BoardEvent::SpiTransfer {
            device,
            mosi: mosi.to_vec(),
            miso: miso.clone(),
        });
        miso
    }
}

type Shared = Rc<RefCell<BoardState>>;

/// Simulated Mulle board.
#[derive(Debug, Clone)]
pub struct SimBoard {
    state: Shared,
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBoard {
    /// Board at power-on reset: registers at reset values, no line
    /// configured, an already-settled radio.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(BoardState::new())),
        }
    }

    /// Board whose radio follows `radio`.
    pub fn with_radio(radio: SimRadio) -> Self {
        let board = Self::new();
        board.state.borrow_mut().radio = radio;
        board
    }

    // ── handles ─────────────────────────────────────────────────────────────

    /// Register-file handle.
    pub fn registers(&self) -> SimRegisterFile {
        SimRegisterFile {
            state: Rc::clone(&self.state),
        }
    }

    /// GPIO driver handle.
    pub fn gpio(&self) -> SimGpio {
        SimGpio {
            state: Rc::clone(&self.state),
        }
    }

    /// SPI0 handle.
    pub fn spi(&self) -> SimSpi {
        SimSpi {
            state: Rc::clone(&self.state),
        }
    }

    /// Spin-delay handle; records the count and returns immediately.
    pub fn delay(&self) -> SimSpin {
        SimSpin {
            state: Rc::clone(&self.state),
        }
    }

    /// Core-init handle.
    pub fn core(&self) -> SimCore {
        SimCore {
            state: Rc::clone(&self.state),
        }
    }

    /// Low-power-init handle.
    pub fn lpm(&self) -> SimLowPower {
        SimLowPower {
            state: Rc::clone(&self.state),
        }
    }

    // ── inspection ──────────────────────────────────────────────────────────

    /// Snapshot of the event log.
    pub fn events(&self) -> Vec<BoardEvent> {
        self.state.borrow().events.clone()
    }

    /// Index of the first event matching `pred`.
    pub fn position(&self, pred: impl FnMut(&BoardEvent) -> bool) -> Option<usize> {
        self.state.borrow().events.iter().position(pred)
    }

    /// Forget recorded events; device and register state is kept.
    pub fn clear_events(&self) {
        self.state.borrow_mut().events.clear();
    }

    /// Current register value.
    pub fn register(&self, register: Register) -> u32 {
        self.state.borrow().read_register(register)
    }

    /// Overwrite a register without logging a write (models prior boot state).
    pub fn preset_register(&self, register: Register, value: u32) {
        self.state.borrow_mut().registers.insert(register, value);
    }

    /// Every register write, in order.
    pub fn register_writes(&self) -> Vec<(Register, u32)> {
        self.state
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                BoardEvent::RegisterWrite { register, value } => Some((*register, *value)),
                _ => None,
            })
            .collect()
    }

    /// Whether `line` is currently driven high.
    pub fn is_high(&self, line: Line) -> bool {
        self.state.borrow().line(line).high
    }

    /// Whether `line` has been configured as an output.
    pub fn is_output(&self, line: Line) -> bool {
        self.state.borrow().line(line).output
    }

    /// Devices whose chip select is asserted right now.
    pub fn asserted_chip_selects(&self) -> Vec<DeviceId> {
        self.state.borrow().asserted_devices()
    }

    /// Every sampled instant at which more than one chip select was asserted.
    pub fn bus_violations(&self) -> Vec<Vec<DeviceId>> {
        self.state.borrow().violations.clone()
    }

    /// The SPI configuration last passed to `init_master`.
    pub fn spi_config(&self) -> Option<SpiConfig> {
        self.state.borrow().spi_config
    }

    /// Snapshot of the radio model.
    pub fn radio(&self) -> SimRadio {
        self.state.borrow().radio.clone()
    }

    /// Snapshot of the flash model.
    pub fn flash(&self) -> SimFlash {
        self.state.borrow().flash.clone()
    }

    /// Whether the radio is asleep: SLEEP line high after reaching `TRX_OFF`.
    pub fn radio_asleep(&self) -> bool {
        let state = self.state.borrow();
        state.line(board::RADIO_SLEEP).high
            && state.radio.last_status == Some(at86rf231::STATUS_TRX_OFF)
    }

    // ── fault injection ─────────────────────────────────────────────────────

    /// Make every GPIO operation on `line` fail.
    pub fn fail_gpio(&self, line: Line) {
        self.state.borrow_mut().failing_line = Some(line);
    }

    /// Make every SPI bus call fail.
    pub fn fail_spi(&self) {
        self.state.borrow_mut().failing_spi = true;
    }
}

// ── register file ───────────────────────────────────────────────────────────

/// Simulated SIM/MCG register file.
#[derive(Debug, Clone)]
pub struct SimRegisterFile {
    state: Shared,
}

impl RegisterFile for SimRegisterFile {
    fn read(&mut self, register: Register) -> u32 {
        self.state.borrow().read_register(register)
    }

    fn write(&mut self, register: Register, value: u32) {
        let mut state = self.state.borrow_mut();
        state.registers.insert(register, value);
        state
            .events
            .push(BoardEvent::RegisterWrite { register, value });
        if matches!(register, Register::McgC1 | Register::McgC6) {
            state.sync_mcg_status();
        }
    }
}

// ── GPIO ────────────────────────────────────────────────────────────────────

/// Error from the simulated GPIO driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimGpioError {
    /// Injected with [`SimBoard::fail_gpio`].
    Injected(Line),
}

/// Simulated GPIO driver.
#[derive(Debug, Clone)]
pub struct SimGpio {
    state: Shared,
}

impl SimGpio {
    fn check(&self, line: Line) -> Result<(), SimGpioError> {
        if self.state.borrow().failing_line == Some(line) {
            Err(SimGpioError::Injected(line))
        } else {
            Ok(())
        }
    }
}

impl GpioDriver for SimGpio {
    type Error = SimGpioError;

    fn init_output(&mut self, line: Line, pull: Pull) -> Result<(), Self::Error> {
        self.check(line)?;
        let mut state = self.state.borrow_mut();
        state.events.push(BoardEvent::GpioInit { line, pull });
        state.update_line(line, |s| s.output = true);
        Ok(())
    }

    fn set(&mut self, line: Line) -> Result<(), Self::Error> {
        self.check(line)?;
        let mut state = self.state.borrow_mut();
        state.events.push(BoardEvent::GpioSet(line));
        state.update_line(line, |s| s.high = true);
        Ok(())
    }

    fn clear(&mut self, line: Line) -> Result<(), Self::Error> {
        self.check(line)?;
        let mut state = self.state.borrow_mut();
        state.events.push(BoardEvent::GpioClear(line));
        state.update_line(line, |s| s.high = false);
        Ok(())
    }
}

// ── SPI ─────────────────────────────────────────────────────────────────────

/// Error from the simulated SPI bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimSpiError {
    /// A transfer was attempted before `init_master`.
    NotInitialized,
    /// Injected with [`SimBoard::fail_spi`].
    Injected,
}

impl embedded_hal::spi::Error for SimSpiError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Simulated SPI0 master with the on-board device models behind it.
#[derive(Debug, Clone)]
pub struct SimSpi {
    state: Shared,
}

impl SimSpi {
    fn exchange(&mut self, mosi: &[u8]) -> Result<Vec<u8>, SimSpiError> {
        let mut state = self.state.borrow_mut();
        if state.failing_spi {
            return Err(SimSpiError::Injected);
        }
        if state.spi_config.is_none() {
            return Err(SimSpiError::NotInitialized);
        }
        Ok(state.exchange(mosi))
    }
}

impl ErrorType for SimSpi {
    type Error = SimSpiError;
}

impl SpiBus<u8> for SimSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let filler = std::vec![0u8; words.len()];
        let miso = self.exchange(&filler)?;
        words.copy_from_slice(&miso);
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        self.exchange(words).map(|_| ())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        let mut mosi = write.to_vec();
        if read.len() > mosi.len() {
            mosi.resize(read.len(), 0);
        }
        let miso = self.exchange(&mosi)?;
        for (dst, src) in read.iter_mut().zip(miso) {
            *dst = src;
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let miso = self.exchange(words)?;
        words.copy_from_slice(&miso);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl SpiMaster for SimSpi {
    fn init_master(&mut self, config: &SpiConfig) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        state.spi_config = Some(*config);
        state.events.push(BoardEvent::SpiInit(*config));
        Ok(())
    }
}

// ── delay, core, low power ──────────────────────────────────────────────────

/// Zero-time spin that logs its iteration count.
#[derive(Debug, Clone)]
pub struct SimSpin {
    state: Shared,
}

impl SpinDelay for SimSpin {
    fn spin(&mut self, iterations: u32) {
        self.state
            .borrow_mut()
            .events
            .push(BoardEvent::Spin(iterations));
    }
}

/// Simulated CPU init.
#[derive(Debug, Clone)]
pub struct SimCore {
    state: Shared,
}

impl CoreInit for SimCore {
    type Error = Infallible;

    fn start_reference_oscillator(&mut self) -> Result<(), Self::Error> {
        self.state
            .borrow_mut()
            .events
            .push(BoardEvent::ReferenceOscillatorStarted);
        Ok(())
    }

    fn init_core(&mut self) -> Result<(), Self::Error> {
        self.state
            .borrow_mut()
            .events
            .push(BoardEvent::CoreInitialized);
        Ok(())
    }
}

/// Simulated low-power subsystem.
#[derive(Debug, Clone)]
pub struct SimLowPower {
    state: Shared,
}

impl LowPowerInit for SimLowPower {
    type Error = Infallible;

    fn init_low_power(&mut self) -> Result<(), Self::Error> {
        self.state
            .borrow_mut()
            .events
            .push(BoardEvent::LowPowerInitialized);
        Ok(())
    }
}
