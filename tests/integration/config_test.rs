//! Configuration loading from disk

use pairs_guard::config::{Config, ConfigError};
use pairs_guard::telemetry::LogFormat;
use rust_decimal_macros::dec;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_example_config_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml.example");
    let config = Config::load(path).unwrap();

    assert_eq!(config.pair.pair_id(), "PHILLIPS");
    assert_eq!(config.tracker.window, 100);
    assert_eq!(config.tracker.min_samples, 20);
    assert_eq!(config.guard_rail.theoretical_parity, Some(dec!(1.0)));
    assert_eq!(config.guard_rail.max_spread_for("PHILLIPS_B"), Some(dec!(2.0)));
    assert_eq!(config.guard_rail.effective_position_limit(), 95);
    assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
}

#[test]
fn test_load_from_temp_file() {
    let file = write_config(
        r#"
        [pair]
        instrument_a = "X"
        instrument_b = "Y"

        [guard_rail]
        max_position_size = 25

        [guard_rail.max_acceptable_spread]
        X = 0.5
        Y = 0.5

        [telemetry]
        log_format = "json"
        "#,
    );

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.pair.pair_id(), "X-Y");
    assert_eq!(config.guard_rail.max_position_size, 25);
    assert_eq!(config.guard_rail.required_margin(25), dec!(100));
    assert_eq!(config.telemetry.log_format, LogFormat::Json);
}

#[test]
fn test_load_rejects_invalid_relations() {
    let file = write_config(
        r#"
        [pair]
        instrument_a = "X"
        instrument_b = "Y"

        [guard_rail]
        entry_stdev_multiplier = 0.2
        exit_stdev_multiplier = 0.8

        [guard_rail.max_acceptable_spread]
        X = 0.5
        Y = 0.5
        "#,
    );

    let err = Config::load(file.path()).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ConfigError>(),
        Some(&ConfigError::ExitNotBelowEntry {
            entry: dec!(0.2),
            exit: dec!(0.8)
        })
    );
}

#[test]
fn test_load_rejects_missing_spread_limit() {
    let file = write_config(
        r#"
        [pair]
        instrument_a = "X"
        instrument_b = "Y"
        "#,
    );

    let err = Config::load(file.path()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::MissingMaxSpread(_))
    ));
}

#[test]
fn test_load_rejects_malformed_toml() {
    let file = write_config("[pair\ninstrument_a = ");
    assert!(Config::load(file.path()).is_err());
}
