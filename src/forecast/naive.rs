use super::{DEFAULT_INTERVAL_Z, ForecastError, Forecaster, check_history, future_timestamp};
use crate::anomaly::SeriesStats;
use crate::series::{ForecastPoint, Series};

/// Length of the repeated season in hours.
const SEASON: usize = 24;

/// Seasonal naive "tomorrow is today" forecaster.
///
/// Repeats the last 24 observed hours across the horizon. The interval
/// half-width is `z * sigma * sqrt(ceil(k / 24))`, where sigma is the spread
/// of day-over-day differences in the history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NaiveForecast {
    interval_z: f64,
}

impl Default for NaiveForecast {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL_Z)
    }
}

impl NaiveForecast {
    pub fn new(interval_z: f64) -> Self {
        Self { interval_z }
    }
}

impl Forecaster for NaiveForecast {
    fn name(&self) -> &'static str {
        "naive"
    }

    fn forecast(
        &self,
        series: &Series,
        horizon: usize,
    ) -> Result<Vec<ForecastPoint>, ForecastError> {
        if horizon == 0 {
            return Ok(Vec::new());
        }
        check_history(self.name(), series, SEASON)?;

        let values = series.values();
        let last_day = &values[values.len() - SEASON..];
        let diffs: Vec<f64> = values
            .windows(SEASON + 1)
            .map(|w| w[SEASON] - w[0])
            .collect();
        let sigma = SeriesStats::from_values(&diffs).std_dev;

        let points = (1..=horizon)
            .map(|k| {
                let predicted = last_day[(k - 1) % SEASON];
                let seasons_ahead = k.div_ceil(SEASON) as f64;
                let half = self.interval_z * sigma * seasons_ahead.sqrt();
                ForecastPoint {
                    timestamp: future_timestamp(series, k),
                    predicted_consumption: predicted,
                    lower_bound: predicted - half,
                    upper_bound: predicted + half,
                }
            })
            .collect();
        Ok(points)
    }
}
