use std::io::Write;

use oddsfeed::application::engine::EngineSettings;
use oddsfeed::application::trade::TradeSettings;
use oddsfeed::error::{ConfigError, Error};
use oddsfeed::infrastructure::config::instrument::build_registry;
use oddsfeed::infrastructure::config::settings::Config;
use oddsfeed::testkit::config::{minimal_toml, sample_toml};
use tempfile::NamedTempFile;

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

#[test]
fn config_loads_sample_file() {
    let file = write_temp_config(&sample_toml());
    let config = Config::load(file.path()).unwrap();

    let engine: EngineSettings = (&config.engine).into();
    assert_eq!(engine.tick_interval.as_millis(), 500);
    assert_eq!(engine.derived_timeframes.len(), 3);

    let trading: TradeSettings = (&config.trading).into();
    assert_eq!(trading.settlement_attempts, 3);
    assert_eq!(trading.settlement_backoff.as_millis(), 200);

    let registry = build_registry(&config.instruments);
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.payout_percent(&"EURUSD".into()), Some(85));
    assert_eq!(registry.get(&"EURUSD".into()).unwrap().digits(), 5);
}

#[test]
fn omitted_payout_uses_default() {
    let config = Config::parse_toml(&minimal_toml()).unwrap();
    let registry = build_registry(&config.instruments);
    assert_eq!(registry.payout_percent(&"BTCUSD".into()), Some(75));
}

#[test]
fn config_rejects_negative_seed_balance() {
    let toml = format!(
        "{}\n[[accounts]]\nuser_id = \"demo\"\nbalance = -5\n",
        minimal_toml()
    );
    let file = write_temp_config(&toml);

    match Config::load(file.path()) {
        Err(Error::Config(ConfigError::InvalidValue {
            field: "balance", ..
        })) => {}
        Err(err) => panic!("Expected invalid balance error, got {err}"),
        Ok(_) => panic!("Expected invalid balance error, got Ok"),
    }
}

#[test]
fn config_rejects_unknown_log_format() {
    let toml = format!("[logging]\nformat = \"xml\"\n\n{}", minimal_toml());

    match Config::parse_toml(&toml) {
        Err(Error::Config(ConfigError::InvalidValue { field: "format", .. })) => {}
        other => panic!("Expected invalid format error, got {other:?}"),
    }
}

#[test]
fn config_rejects_bad_timeframe_label() {
    let toml = format!("[engine]\nbase_timeframe = \"5x\"\n\n{}", minimal_toml());
    assert!(matches!(
        Config::parse_toml(&toml),
        Err(Error::Config(ConfigError::Parse(_)))
    ));
}

#[test]
fn config_parses_calendars() {
    let toml = minimal_toml()
        + r#"
[instruments.calendar]
trades_weekends = false
holidays = ["2026-12-25"]

[[instruments.calendar.maintenance]]
start = "2026-10-20T02:00:00Z"
end = "2026-10-20T03:00:00Z"

[[instruments.calendar.maintenance]]
start = "2026-11-01T00:00:00Z"
"#;
    let config = Config::parse_toml(&toml).unwrap();
    let calendar = &config.instruments[0].calendar;

    assert!(!calendar.trades_weekends);
    assert_eq!(calendar.holidays.len(), 1);
    assert_eq!(calendar.maintenance.len(), 2);
    assert!(calendar.maintenance[1].end.is_none());
}
