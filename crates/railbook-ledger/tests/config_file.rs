//! Configuration loading from disk and its effect on a running engine.

use std::io::Write;
use std::sync::Arc;

use railbook_core::{AccountId, Credits, ManualClock, StationName, Timestamp, MILLIS_PER_MINUTE};
use railbook_ledger::{BookingEngine, ConfigError, LedgerConfig, NewTrain};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn loads_yaml_file() {
    let file = write_config("refund_cutoff_ms: 600000\nmax_seat_capacity: 50\n");
    let config = LedgerConfig::from_path(file.path()).unwrap();
    assert_eq!(config.refund_cutoff_ms, 600_000);
    assert_eq!(config.max_seat_capacity, 50);
    assert_eq!(config.event_capacity, LedgerConfig::default().event_capacity);
}

#[test]
fn malformed_file_is_parse_error() {
    let file = write_config("refund_cutoff_ms: [not, a, number]\n");
    let err = LedgerConfig::from_path(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn engine_rejects_invalid_config() {
    let config = LedgerConfig {
        event_capacity: 0,
        ..LedgerConfig::default()
    };
    assert!(BookingEngine::init(config).is_err());
}

#[test]
fn shorter_cutoff_moves_refund_deadline() {
    let file = write_config("refund_cutoff_ms: 600000\n");
    let config = LedgerConfig::from_path(file.path()).unwrap();
    let clock = Arc::new(ManualClock::new(Timestamp::from_millis(1_767_225_600_000)));
    let (engine, admin) = BookingEngine::init_with_clock(config, clock.clone()).unwrap();
    let train = engine
        .create_train(
            &admin,
            NewTrain {
                origin: StationName::new("Krakow").unwrap(),
                destination: StationName::new("Warsaw").unwrap(),
                seat_capacity: 10,
                price: Credits::new(20),
                start_offset_minutes: 0,
                end_offset_minutes: 60,
            },
        )
        .unwrap();
    let alice = AccountId::new("alice").unwrap();
    let ticket = engine.buy(train, alice.clone(), Credits::new(20), 4).unwrap();

    // Forty-five minutes in: inside the default hour, outside ten minutes.
    clock.advance(45 * MILLIS_PER_MINUTE);
    assert_eq!(engine.refund(train, ticket, &alice).unwrap(), Credits::new(20));
}

#[test]
fn capacity_ceiling_comes_from_config() {
    let file = write_config("max_seat_capacity: 8\n");
    let (engine, admin) = BookingEngine::init(LedgerConfig::from_path(file.path()).unwrap()).unwrap();
    let err = engine
        .create_train(
            &admin,
            NewTrain {
                origin: StationName::new("Krakow").unwrap(),
                destination: StationName::new("Gdansk").unwrap(),
                seat_capacity: 9,
                price: Credits::new(20),
                start_offset_minutes: 0,
                end_offset_minutes: 60,
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), "validation");
}
