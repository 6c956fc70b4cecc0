//! Mulle boot bring-up
//!
//! Run-once hardware bring-up for the Eistec Mulle (Kinetis K60): clock tree,
//! supply rails, SPI0 device power-down, then hand-off to the application.
//!
//! # Architecture
//!
//! ```text
//! Bringup orchestrator (boot)
//!         ↓
//! ClockSequencer · PowerRailController · TraceGpioInitializer · SpiDeviceSleeper
//!         ↓
//! platform contracts (RegisterFile, GpioDriver, SpiMaster, SpinDelay, ...)
//!         ↓
//! platform::kinetis (hardware)   platform::mocks (host tests)
//! ```
//!
//! Phases hand each other zero-sized proof tokens (`ClocksSettled` →
//! `CoreReady` → `RailsPowered` → `SpiBusReady`), so calling a step before
//! its precondition does not type-check.
//!
//! # Features
//!
//! - `hardware` - Build for the K60 target (cortex-m-rt, defmt over RTT)
//! - `trace-*` - Configure the matching low-power trace output
//! - `radio-driver` - Leave the AT86RF231 to its driver
//!
//! # Hardware Target
//!
//! ```bash
//! K60_CPU_REV=2 cargo build -p mulle-firmware --release --features hardware --target thumbv7em-none-eabi
//! ```

#![cfg_attr(not(test), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Critical correctness: deny these
#![deny(unsafe_op_in_unsafe_fn)]
// unsafe fn body is not implicitly unsafe block
// Logging discipline (allow println in tests via clippy.toml)
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)] // common in Rust crates; not a real issue
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
// Pedantic lints too noisy for firmware application code:
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]

#[macro_use]
mod fmt;

pub mod boot;
pub mod clock;
pub mod config;
pub mod error;
pub mod power;
pub mod spi_sleep;
pub mod trace;

// Re-export key types
pub use boot::{Board, Bringup, BringupReport, Complete, CoreReady, Pending, BOOT_SEQUENCE_STEPS};
pub use clock::{ClockSequencer, ClocksSettled};
pub use config::{BringupConfig, RadioPolicy};
pub use error::BringupError;
pub use power::{PowerRailController, RailsPowered};
pub use spi_sleep::{init_onboard_spi, RadioConvergenceState, SpiBusReady, SpiDeviceSleeper};
pub use trace::TraceGpioInitializer;
