//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use meter_analytics::catalog::CityCatalog;
use meter_analytics::config::AnalyticsConfig;
use meter_analytics::io::totals::AnnualTotals;
use meter_analytics::series::Dataset;
use meter_analytics::sim::{SimulationParams, Simulator};

/// 2024-01-01 00:00, the fixed start used across tests.
pub fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

/// One week, daily amplitude 20, noise 3, seed 42.
pub fn week_params(seed: u64) -> SimulationParams {
    SimulationParams::new(t0(), 168, 20.0, 3.0, seed)
}

/// The ten built-in cities simulated over [`week_params`].
pub fn ten_city_week(seed: u64) -> Dataset {
    let catalog = CityCatalog::builtin("turkey10").unwrap();
    let names: Vec<&str> = catalog.names().collect();
    Simulator::new(week_params(seed)).generate(&names, &AnnualTotals::default())
}

/// `turkey10` preset writing to `dir`, limited to `cities`.
pub fn config_in(dir: &Path, cities: &[&str]) -> AnalyticsConfig {
    let mut config = AnalyticsConfig::turkey10();
    config.simulation.include = cities.iter().map(|c| c.to_string()).collect();
    config.dashboard.default_cities = cities.iter().take(1).map(|c| c.to_string()).collect();
    config.data.path = dir.join("consumption.csv");
    config
}
