//! Integration tests for configuration presets and TOML files.

use meter_analytics::config::AnalyticsConfig;

#[test]
fn every_preset_validates() {
    for name in AnalyticsConfig::PRESETS {
        let config = AnalyticsConfig::from_preset(name).unwrap();
        assert!(config.validate().is_empty(), "{name}: {:?}", config.validate());
        assert!(config.catalog().is_ok(), "{name}");
    }
}

#[test]
fn turkey81_covers_all_provinces() {
    let config = AnalyticsConfig::turkey81();
    assert_eq!(config.catalog().unwrap().len(), 81);
}

#[test]
fn toml_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("analytics.toml");
    std::fs::write(
        &path,
        r#"
[simulation]
hours = 72
seed = 5
cities = "turkey81"
include = ["Van", "Rize"]

[forecast]
model = "naive"
horizon_hours = 24

[data]
path = "out/readings.csv"
"#,
    )
    .unwrap();

    let config = AnalyticsConfig::from_toml_file(&path).unwrap();
    assert_eq!(config.simulation.hours, 72);
    assert_eq!(config.forecast.model, "naive");
    assert_eq!(config.catalog().unwrap().len(), 2);
    assert!(config.validate().is_empty());
}

#[test]
fn unknown_keys_are_rejected() {
    assert!(AnalyticsConfig::from_toml_str("[simulation]\nhourz = 3\n").is_err());
}
