//! Consumption forecasting behind a narrow trait.
//!
//! Every model maps a gap-free hourly [`Series`] to `horizon` points starting
//! one hour after the series' last reading.

/// Trend plus daily and weekly seasonality.
pub mod additive;
/// Seasonal "tomorrow is today" model.
pub mod naive;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::config::ForecastConfig;
use crate::series::{ForecastPoint, Series};

pub use additive::AdditiveForecast;
pub use naive::NaiveForecast;

/// z-value of a central 80 % normal interval.
pub const DEFAULT_INTERVAL_Z: f64 = 1.2816;

/// Why a forecast could not be produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("{model} forecast needs at least {required} hours of history, got {available}")]
    InsufficientHistory {
        model: &'static str,
        required: usize,
        available: usize,
    },
    #[error("non-finite consumption at {timestamp}")]
    NonFinite { timestamp: NaiveDateTime },
}

/// Projects a city's consumption forward.
pub trait Forecaster {
    /// Short identifier shown in the dashboard and logs.
    fn name(&self) -> &'static str;

    /// Predicts `horizon` hourly points after the end of `series`.
    ///
    /// # Errors
    ///
    /// Returns a [`ForecastError`] when the series is too short or holds
    /// non-finite values. A zero horizon yields an empty forecast.
    fn forecast(
        &self,
        series: &Series,
        horizon: usize,
    ) -> Result<Vec<ForecastPoint>, ForecastError>;
}

/// The configured forecasting model.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastModel {
    Additive(AdditiveForecast),
    Naive(NaiveForecast),
}

impl Default for ForecastModel {
    fn default() -> Self {
        Self::Additive(AdditiveForecast::default())
    }
}

impl ForecastModel {
    /// Builds the model named by `config.model` (`"additive"` or `"naive"`).
    pub fn from_config(config: &ForecastConfig) -> Self {
        match config.model.as_str() {
            "naive" => Self::Naive(NaiveForecast::new(config.interval_z)),
            _ => Self::Additive(AdditiveForecast::new(
                config.interval_z,
                config.weekly_seasonality,
            )),
        }
    }
}

impl Forecaster for ForecastModel {
    fn name(&self) -> &'static str {
        match self {
            Self::Additive(m) => m.name(),
            Self::Naive(m) => m.name(),
        }
    }

    fn forecast(
        &self,
        series: &Series,
        horizon: usize,
    ) -> Result<Vec<ForecastPoint>, ForecastError> {
        match self {
            Self::Additive(m) => m.forecast(series, horizon),
            Self::Naive(m) => m.forecast(series, horizon),
        }
    }
}

/// Rejects series that are too short or contain NaN/inf.
fn check_history(
    model: &'static str,
    series: &Series,
    required: usize,
) -> Result<(), ForecastError> {
    if series.len() < required {
        return Err(ForecastError::InsufficientHistory {
            model,
            required,
            available: series.len(),
        });
    }
    match series.values().iter().position(|v| !v.is_finite()) {
        Some(i) => Err(ForecastError::NonFinite {
            timestamp: series.timestamp_at(i),
        }),
        None => Ok(()),
    }
}

/// Timestamp of the `k`-th step (1-based) after the series ends.
fn future_timestamp(series: &Series, k: usize) -> NaiveDateTime {
    series.timestamp_at(series.len() - 1 + k)
}
