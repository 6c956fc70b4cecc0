//! SPI0 devices and the command bytes bring-up sends them.
//!
//! Every transaction is one opcode byte, optionally followed by one data or
//! filler byte, with the device's chip select held low for its duration.

use crate::gpio::Line;

/// Devices sharing SPI0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceId {
    /// AT86RF231 2.4 GHz transceiver.
    Radio,
    /// LIS3DH accelerometer.
    Accelerometer,
    /// FRAM/NVRAM.
    Nvram,
    /// SPI NOR flash.
    Flash,
}

/// A device on the shared bus, identified by its chip-select line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiDevice {
    /// Which device.
    pub id: DeviceId,
    /// Active-low chip select.
    pub cs: Line,
}

impl SpiDevice {
    /// Declare a device.
    pub const fn new(id: DeviceId, cs: Line) -> Self {
        Self { id, cs }
    }
}

/// NOR flash: Deep Power-Down (DP). No response; exited only by a
/// Release-from-Deep-Power-Down command.
pub const FLASH_DEEP_POWER_DOWN: u8 = 0xB9;

/// AT86RF231 register-access command bits.
pub mod at86rf231 {
    /// Register read: `0b10 << 6 | addr`.
    pub const REG_READ: u8 = 0x80;
    /// Register write: `0b11 << 6 | addr`.
    pub const REG_WRITE: u8 = 0xC0;

    /// `TRX_STATUS` register address.
    pub const TRX_STATUS: u8 = 0x01;
    /// `TRX_STATE` register address.
    pub const TRX_STATE: u8 = 0x02;

    /// `TRX_CMD` value forcing the state machine to `TRX_OFF`.
    pub const CMD_FORCE_TRX_OFF: u8 = 0x03;
    /// `TRX_STATUS` value once the transceiver is idle in `TRX_OFF`.
    pub const STATUS_TRX_OFF: u8 = 0x08;
    /// `TRX_STATUS` while a state transition is in progress.
    pub const STATUS_TRANSITION_IN_PROGRESS: u8 = 0x1F;
    /// `TRX_STATUS` in `RX_ON`.
    pub const STATUS_RX_ON: u8 = 0x06;

    /// Filler byte clocked out while the register value comes back.
    pub const FILLER: u8 = 0x00;

    /// Opcode reading `TRX_STATUS` (0x81).
    pub const READ_TRX_STATUS: u8 = REG_READ | TRX_STATUS;
    /// Opcode writing `TRX_STATE` (0xC2).
    pub const WRITE_TRX_STATE: u8 = REG_WRITE | TRX_STATE;
}
