//! Integration test: at most one SPI0 chip select is ever asserted.
//!
//! The simulated board samples the chip-select lines after every GPIO change
//! and every SPI transfer, and records any instant with more than one device
//! selected. Random interleavings of flash power-down and radio convergence
//! must leave that record empty and every chip select idle in between.
//!
//! Run with: cargo test -p mulle-firmware --test bus_exclusivity

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

mod common;

use std::num::NonZeroU32;

use firmware::config::RADIO_SETTLE_SPINS;
use firmware::{BringupConfig, SpiDeviceSleeper};
use platform::board;
use platform::mocks::{BoardEvent, SimBoard, SimRadio};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Op {
    PowerDownFlash,
    SleepRadio { max_reads: u32 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::PowerDownFlash),
        (1u32..6).prop_map(|max_reads| Op::SleepRadio { max_reads }),
    ]
}

fn radio_statuses() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop_oneof![Just(0x06u8), Just(0x1F), Just(0x00), Just(0x08)], 0..12)
}

proptest! {
    #[test]
    fn interleaved_device_operations_never_share_the_bus(
        statuses in radio_statuses(),
        ops in prop::collection::vec(op(), 1..16),
    ) {
        let sim = SimBoard::with_radio(SimRadio::with_statuses(statuses));
        let bus = common::spi_bus_ready(&sim);
        let mut sleeper =
            SpiDeviceSleeper::new(sim.gpio(), sim.spi(), sim.delay(), RADIO_SETTLE_SPINS, &bus);

        for op in ops {
            match op {
                Op::PowerDownFlash => sleeper.power_down_flash().unwrap(),
                Op::SleepRadio { max_reads } => {
                    // Running out of attempts is fine here; the bus discipline is what matters.
                    let _ = sleeper.sleep_radio_within(NonZeroU32::new(max_reads).unwrap());
                }
            }
            prop_assert!(sim.asserted_chip_selects().is_empty());
        }

        prop_assert!(sim.bus_violations().is_empty());
        for device in board::SPI0_DEVICES {
            prop_assert!(sim.is_high(device.cs));
        }
    }

    #[test]
    fn every_transfer_sees_exactly_one_device(statuses in radio_statuses()) {
        let sim = SimBoard::with_radio(SimRadio::with_statuses(statuses));
        common::run(&sim, BringupConfig::mulle()).unwrap();

        for event in sim.events() {
            if let BoardEvent::SpiTransfer { device, .. } = event {
                prop_assert!(device.is_some());
            }
        }
        prop_assert!(sim.bus_violations().is_empty());
    }
}

#[test]
fn chip_selects_never_glitch_low_during_setup() {
    let sim = SimBoard::new();
    common::run(&sim, BringupConfig::mulle()).unwrap();

    // Until the master is configured no chip select may be driven low.
    let events = sim.events();
    let spi_init = common::first(&events, "SPI init", |e| matches!(e, BoardEvent::SpiInit(_)));
    for device in board::SPI0_DEVICES {
        assert!(!events[..spi_init]
            .iter()
            .any(|e| *e == BoardEvent::GpioClear(device.cs)));
    }
}
