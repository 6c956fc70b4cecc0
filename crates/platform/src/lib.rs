//! Hardware contracts for Mulle (Kinetis K60) bring-up
//!
//! This crate provides the capabilities the boot sequence is written against,
//! so the sequencing logic runs unchanged on silicon and on a host.
//!
//! # Architecture Layers
//!
//! ```text
//! Boot sequence (firmware crate)
//!         ↓
//! Contracts (this crate: RegisterFile, GpioDriver, SpiMaster, SpinDelay, ...)
//!         ↓                              ↓
//! kinetis:: memory-mapped backends    mocks:: simulated board (std/test)
//! ```
//!
//! # Contents
//!
//! - [`registers`] - register-access capability and clock field layout
//! - [`clock_config`] - divider validation and derived frequencies
//! - [`revision`] - revision-specific reference selection
//! - [`mcg`] - clock generator mode driver
//! - [`gpio`], [`peripheral`], [`power`], [`delay`] - collaborator traits
//! - [`board`], [`devices`] - Mulle pin map and SPI device opcodes
//!
//! # Features
//!
//! - `std`: Enable the simulated board in [`mocks`] for downstream tests
//! - `hardware`: Calibrated spins execute `nop` instructions
//! - `defmt`: Enable defmt logging derives
//!
//! # Example
//!
//! ```
//! use platform::clock_config::{ClockDividerConfig, ClockDomain, DIVIDER_REFERENCE_HZ};
//!
//! let cfg = ClockDividerConfig::MULLE;
//! let flash = cfg.frequency(ClockDomain::Flash, DIVIDER_REFERENCE_HZ);
//! assert!(flash < ClockDomain::Flash.limit());
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware crate:
#![allow(clippy::doc_markdown)] // hex addresses and register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::match_same_arms)] // intentional for readability in register tables
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod board;
pub mod clock_config;
pub mod delay;
pub mod devices;
pub mod gpio;
pub mod kinetis;
pub mod mcg;
pub mod mocks;
pub mod peripheral;
pub mod power;
pub mod registers;
pub mod revision;

// Re-export clock types
pub use clock_config::{ClockConfigError, ClockDividerConfig, ClockDomain, Clocks, Hertz};
pub use mcg::{FllFactor, FllMode, McgMode};
pub use registers::{Field, Register, RegisterFile};
pub use revision::{FllReference, ReferenceSelect, SelectedRevision, CPU_REVISION};

// Re-export collaborator traits
pub use delay::{BusyLoop, SpinDelay};
pub use gpio::{GpioDriver, Line, Port, Pull};
pub use peripheral::{SpiConfig, SpiMaster, SpiMode};
pub use power::{CoreInit, LowPowerInit, PowerRail, RailId};

// Re-export device identities
pub use devices::{DeviceId, SpiDevice};
