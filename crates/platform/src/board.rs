//! Mulle board wiring.
//!
//! All on-board SPI devices sit on SPI0 with individual GPIO chip selects.

use crate::devices::{DeviceId, SpiDevice};
use crate::gpio::{Line, Port};
use crate::power::{PowerRail, RailId};

/// Red LED.
pub const LED_RED: Line = Line::new(Port::C, 15);
/// Yellow LED.
pub const LED_YELLOW: Line = Line::new(Port::C, 14);
/// Green LED.
pub const LED_GREEN: Line = Line::new(Port::C, 13);
/// Every LED, red first.
pub const LEDS: [Line; 3] = [LED_RED, LED_YELLOW, LED_GREEN];

/// Analog supply enable.
pub const AVDD: PowerRail = PowerRail::new(RailId::Avdd, Line::new(Port::B, 17));
/// Peripheral supply enable.
pub const VPERIPH: PowerRail = PowerRail::new(RailId::Vperiph, Line::new(Port::D, 7));
/// Secondary supply enable.
pub const VSEC: PowerRail = PowerRail::new(RailId::Vsec, Line::new(Port::B, 16));
/// Every rail, in declaration order.
pub const RAILS: [PowerRail; 3] = [AVDD, VPERIPH, VSEC];

/// AT86RF231 transceiver.
pub const RADIO: SpiDevice = SpiDevice::new(DeviceId::Radio, Line::new(Port::D, 4));
/// AT86RF231 SLEEP_TR line; high puts the transceiver to sleep from `TRX_OFF`.
pub const RADIO_SLEEP: Line = Line::new(Port::E, 6);
/// LIS3DH accelerometer.
pub const ACCELEROMETER: SpiDevice =
    SpiDevice::new(DeviceId::Accelerometer, Line::new(Port::D, 0));
/// FRAM/NVRAM.
pub const NVRAM: SpiDevice = SpiDevice::new(DeviceId::Nvram, Line::new(Port::D, 6));
/// SPI NOR flash.
pub const FLASH: SpiDevice = SpiDevice::new(DeviceId::Flash, Line::new(Port::D, 5));
/// Every SPI0 device, in chip-select initialisation order.
pub const SPI0_DEVICES: [SpiDevice; 4] = [RADIO, ACCELEROMETER, NVRAM, FLASH];

/// SPI0 SCK (ALT2).
pub const SPI0_SCK: Line = Line::new(Port::D, 1);
/// SPI0 SOUT (ALT2).
pub const SPI0_SOUT: Line = Line::new(Port::D, 2);
/// SPI0 SIN (ALT2).
pub const SPI0_SIN: Line = Line::new(Port::D, 3);

/// SPI0 clock for the on-board devices.
pub const ONBOARD_SPI_HZ: u32 = 5_000_000;

/// Low-power trace outputs, observed with a logic analyser.
pub mod trace {
    use crate::gpio::{Line, Port};

    /// Toggled on low-power mode entry.
    pub const LPM_ENTRY: Line = Line::new(Port::C, 8);
    /// Toggled on low-power mode exit.
    pub const LPM_EXIT: Line = Line::new(Port::C, 9);
    /// High while in WAIT.
    pub const WAIT: Line = Line::new(Port::C, 10);
    /// High while in STOP.
    pub const STOP: Line = Line::new(Port::C, 11);
    /// High while in VLPS.
    pub const VLPS: Line = Line::new(Port::C, 12);
    /// High while in LLS.
    pub const LLS: Line = Line::new(Port::C, 16);
}
