//! Integration test: AT86RF231 convergence to `TRX_OFF` during bring-up.
//!
//! The loop reads `TRX_STATUS`, and while it is not `TRX_OFF` issues
//! `FORCE_TRX_OFF` followed by the settle spin. For a radio that needs `k`
//! corrections the radio traffic is exactly `R (F S R){k}`, followed by
//! SLEEP_TR going high.
//!
//! Run with: cargo test -p mulle-firmware --test radio_convergence

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation
)]
#![cfg(not(feature = "radio-driver"))]

mod common;

use std::num::NonZeroU32;

use common::{radio_script, run};
use firmware::config::RADIO_SETTLE_SPINS;
use firmware::{BringupConfig, BringupError};
use platform::board;
use platform::devices::at86rf231::{STATUS_RX_ON, STATUS_TRANSITION_IN_PROGRESS, STATUS_TRX_OFF};
use platform::mocks::{BoardEvent, SimBoard, SimRadio};
use proptest::prelude::*;

fn expected_script(k: usize) -> String {
    format!("R{}Z", "FSR".repeat(k))
}

#[test]
fn settled_radio_is_read_once_and_never_reset() {
    let sim = SimBoard::with_radio(SimRadio::settled());
    let done = run(&sim, BringupConfig::mulle()).unwrap();

    let radio = done.report().radio.unwrap();
    assert_eq!(radio.status_reads, 1);
    assert_eq!(radio.force_off_commands, 0);
    assert_eq!(radio.last_status, STATUS_TRX_OFF);
    assert_eq!(sim.radio().status_reads(), 1);
    assert_eq!(sim.radio().force_off_commands(), 0);
    assert_eq!(radio_script(&sim.events(), RADIO_SETTLE_SPINS), "RZ");
    assert!(sim.radio_asleep());
}

#[test]
fn three_corrections_alternate_strictly() {
    let sim = SimBoard::with_radio(SimRadio::settling_after(3));
    let done = run(&sim, BringupConfig::mulle()).unwrap();

    let radio = done.report().radio.unwrap();
    assert_eq!(radio.status_reads, 4);
    assert_eq!(radio.force_off_commands, 3);
    assert_eq!(radio_script(&sim.events(), RADIO_SETTLE_SPINS), "RFSRFSRFSRZ");
}

#[test]
fn transition_states_are_not_mistaken_for_trx_off() {
    let sim = SimBoard::with_radio(SimRadio::with_statuses([
        STATUS_TRANSITION_IN_PROGRESS,
        0x00,
        STATUS_RX_ON,
    ]));
    let done = run(&sim, BringupConfig::mulle()).unwrap();
    assert_eq!(done.report().radio.unwrap().force_off_commands, 3);
    assert_eq!(radio_script(&sim.events(), RADIO_SETTLE_SPINS), expected_script(3));
}

#[test]
fn status_read_and_force_off_frames() {
    let sim = SimBoard::with_radio(SimRadio::settling_after(1));
    run(&sim, BringupConfig::mulle()).unwrap();

    let radio_frames: Vec<_> = sim
        .events()
        .into_iter()
        .filter_map(|e| match e {
            BoardEvent::SpiTransfer {
                device: Some(platform::DeviceId::Radio),
                mosi,
                miso,
            } => Some((mosi, miso)),
            _ => None,
        })
        .collect();
    assert_eq!(
        radio_frames,
        vec![
            (vec![0x81, 0x00], vec![0x00, STATUS_RX_ON]),
            (vec![0xC2, 0x03], vec![0x00, 0x00]),
            (vec![0x81, 0x00], vec![0x00, STATUS_TRX_OFF]),
        ]
    );
}

#[test]
fn sleep_line_rises_only_after_trx_off() {
    let sim = SimBoard::with_radio(SimRadio::settling_after(2));
    run(&sim, BringupConfig::mulle()).unwrap();
    let events = sim.events();
    let final_read = common::last(&events, "radio read", |e| {
        matches!(e, BoardEvent::SpiTransfer { mosi, .. } if mosi.first() == Some(&0x81))
    });
    let sleep = common::first(&events, "SLEEP_TR high", |e| {
        *e == BoardEvent::GpioSet(board::RADIO_SLEEP)
    });
    assert!(final_read < sleep);
}

#[test]
fn bounded_mode_reports_an_unresponsive_radio() {
    let sim = SimBoard::with_radio(SimRadio::unresponsive());
    let config = BringupConfig {
        radio_attempt_limit: NonZeroU32::new(8),
        ..BringupConfig::mulle()
    };
    let err = run(&sim, config).err().unwrap();

    assert_eq!(
        err,
        BringupError::RadioNotSettled {
            last_status: STATUS_TRANSITION_IN_PROGRESS,
            attempts: 8,
        }
    );
    assert_eq!(sim.radio().status_reads(), 8);
    assert_eq!(sim.radio().force_off_commands(), 7);
    assert!(!sim.is_high(board::RADIO_SLEEP));
    assert!(!sim.events().contains(&BoardEvent::LowPowerInitialized));
    assert!(sim.asserted_chip_selects().is_empty());
}

#[test]
fn bound_is_not_hit_by_a_radio_that_settles_in_time() {
    let sim = SimBoard::with_radio(SimRadio::settling_after(4));
    let config = BringupConfig {
        radio_attempt_limit: NonZeroU32::new(5),
        ..BringupConfig::mulle()
    };
    let done = run(&sim, config).unwrap();
    assert_eq!(done.report().radio.unwrap().status_reads, 5);
}

proptest! {
    #[test]
    fn k_corrections_mean_k_plus_one_reads(k in 0usize..24) {
        let sim = SimBoard::with_radio(SimRadio::settling_after(k));
        let done = run(&sim, BringupConfig::mulle()).unwrap();
        let radio = done.report().radio.unwrap();

        prop_assert_eq!(radio.force_off_commands as usize, k);
        prop_assert_eq!(radio.status_reads as usize, k + 1);
        prop_assert_eq!(radio_script(&sim.events(), RADIO_SETTLE_SPINS), expected_script(k));
        prop_assert!(sim.bus_violations().is_empty());
    }
}
