//! Hourly electricity consumption analytics for a set of cities.
//!
//! Synthetic consumption is simulated per city, persisted as CSV, scored for
//! anomalies with per-city z-scores and forecast with a seasonal model. The
//! dashboard model is shared by a web front-end (`api`) and a terminal one
//! (`tui`).

/// Per-city z-score anomaly detection.
pub mod anomaly;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod dashboard;
/// Forecasting behind the [`forecast::Forecaster`] trait.
pub mod forecast;
/// CSV persistence and exports.
pub mod io;
pub mod logging;
pub mod recommend;
pub mod runner;
pub mod series;
/// Synthetic consumption simulator.
pub mod sim;

#[cfg(feature = "api")]
pub mod api;
#[cfg(feature = "tui")]
pub mod tui;
