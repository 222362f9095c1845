use chrono::{Datelike, NaiveDateTime, Timelike};
use tracing::debug;

use super::{DEFAULT_INTERVAL_Z, ForecastError, Forecaster, check_history, future_timestamp};
use crate::anomaly::SeriesStats;
use crate::series::{ForecastPoint, Series};

const HOURS_PER_DAY: usize = 24;
const HOURS_PER_WEEK: usize = 168;

/// Shortest history the model accepts (two full days).
pub const MIN_HISTORY_HOURS: usize = 2 * HOURS_PER_DAY;

/// History needed before the hour-of-week component is fitted.
pub const WEEKLY_HISTORY_HOURS: usize = 2 * HOURS_PER_WEEK;

/// Additive decomposition `trend + daily + weekly + noise`.
///
/// The trend line and the hour-of-day levels are fitted jointly by least
/// squares over the hour index. The weekly component, fitted only with at
/// least two weeks of history, is the centered mean of what remains per hour
/// of week. Bounds are
/// `y ± z * sigma * sqrt(1 + k / n)` with sigma the in-sample residual
/// standard deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdditiveForecast {
    interval_z: f64,
    weekly_seasonality: bool,
}

impl Default for AdditiveForecast {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL_Z, true)
    }
}

impl AdditiveForecast {
    pub fn new(interval_z: f64, weekly_seasonality: bool) -> Self {
        Self {
            interval_z,
            weekly_seasonality,
        }
    }

    /// Fits the decomposition to `series`, which must be validated already.
    fn fit(&self, series: &Series) -> FittedModel {
        let values = series.values();
        let n = values.len();
        let (intercept, slope, daily) = trend_with_daily(series);

        let after_daily: Vec<f64> = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                v - (intercept + slope * i as f64) - daily[hour_of_day(series.timestamp_at(i))]
            })
            .collect();

        let weekly = (self.weekly_seasonality && n >= WEEKLY_HISTORY_HOURS)
            .then(|| seasonal_means(series, &after_daily, HOURS_PER_WEEK, hour_of_week));

        let residuals: Vec<f64> = after_daily
            .iter()
            .enumerate()
            .map(|(i, r)| match &weekly {
                Some(w) => r - w[hour_of_week(series.timestamp_at(i))],
                None => *r,
            })
            .collect();

        FittedModel {
            n,
            intercept,
            slope,
            daily,
            weekly,
            sigma: SeriesStats::from_values(&residuals).std_dev,
        }
    }
}

impl Forecaster for AdditiveForecast {
    fn name(&self) -> &'static str {
        "additive"
    }

    fn forecast(
        &self,
        series: &Series,
        horizon: usize,
    ) -> Result<Vec<ForecastPoint>, ForecastError> {
        if horizon == 0 {
            return Ok(Vec::new());
        }
        check_history(self.name(), series, MIN_HISTORY_HOURS)?;

        let model = self.fit(series);
        debug!(
            city = series.city(),
            slope = model.slope,
            sigma = model.sigma,
            weekly = model.weekly.is_some(),
            "fitted additive model"
        );

        let n = model.n as f64;
        let points = (1..=horizon)
            .map(|k| {
                let timestamp = future_timestamp(series, k);
                let predicted = model.predict(model.n - 1 + k, timestamp);
                let half = self.interval_z * model.sigma * (1.0 + k as f64 / n).sqrt();
                ForecastPoint {
                    timestamp,
                    predicted_consumption: predicted,
                    lower_bound: predicted - half,
                    upper_bound: predicted + half,
                }
            })
            .collect();
        Ok(points)
    }
}

struct FittedModel {
    n: usize,
    intercept: f64,
    slope: f64,
    daily: Vec<f64>,
    weekly: Option<Vec<f64>>,
    sigma: f64,
}

impl FittedModel {
    fn predict(&self, index: usize, timestamp: NaiveDateTime) -> f64 {
        let trend = self.intercept + self.slope * index as f64;
        let weekly = self
            .weekly
            .as_ref()
            .map_or(0.0, |w| w[hour_of_week(timestamp)]);
        trend + self.daily[hour_of_day(timestamp)] + weekly
    }
}

/// Joint least-squares fit of `y = intercept + slope * i + daily[hour]`.
///
/// The slope is the within-hour estimator: index and value are demeaned per
/// hour of day before regressing, so a daily cycle never leaks into the
/// trend. Returns the centered hour-of-day levels alongside.
fn trend_with_daily(series: &Series) -> (f64, f64, Vec<f64>) {
    let values = series.values();
    let mut sum_i = [0.0; HOURS_PER_DAY];
    let mut sum_y = [0.0; HOURS_PER_DAY];
    let mut counts = [0usize; HOURS_PER_DAY];
    for (i, y) in values.iter().enumerate() {
        let h = hour_of_day(series.timestamp_at(i));
        sum_i[h] += i as f64;
        sum_y[h] += y;
        counts[h] += 1;
    }
    let slot_mean = |sums: &[f64; HOURS_PER_DAY], h: usize| {
        if counts[h] > 0 { sums[h] / counts[h] as f64 } else { 0.0 }
    };

    let (sxy, sxx) = values.iter().enumerate().fold((0.0, 0.0), |(sxy, sxx), (i, y)| {
        let h = hour_of_day(series.timestamp_at(i));
        let dx = i as f64 - slot_mean(&sum_i, h);
        (sxy + dx * (y - slot_mean(&sum_y, h)), sxx + dx * dx)
    });
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };

    let levels: Vec<f64> = (0..HOURS_PER_DAY)
        .map(|h| slot_mean(&sum_y, h) - slope * slot_mean(&sum_i, h))
        .collect();
    let observed = counts.iter().filter(|c| **c > 0).count().max(1);
    let intercept = levels
        .iter()
        .zip(&counts)
        .filter(|(_, c)| **c > 0)
        .map(|(l, _)| l)
        .sum::<f64>()
        / observed as f64;
    let daily = levels
        .iter()
        .zip(&counts)
        .map(|(l, &c)| if c > 0 { l - intercept } else { 0.0 })
        .collect();

    (intercept, slope, daily)
}

/// Centered per-slot means of `residuals`; slots never observed stay 0.
fn seasonal_means(
    series: &Series,
    residuals: &[f64],
    period: usize,
    slot: fn(NaiveDateTime) -> usize,
) -> Vec<f64> {
    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (i, r) in residuals.iter().enumerate() {
        let s = slot(series.timestamp_at(i));
        sums[s] += r;
        counts[s] += 1;
    }

    let mut means: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
        .collect();
    let observed = counts.iter().filter(|c| **c > 0).count();
    if observed > 0 {
        let center = means.iter().sum::<f64>() / observed as f64;
        for (m, &c) in means.iter_mut().zip(&counts) {
            if c > 0 {
                *m -= center;
            }
        }
    }
    means
}

fn hour_of_day(ts: NaiveDateTime) -> usize {
    ts.hour() as usize
}

fn hour_of_week(ts: NaiveDateTime) -> usize {
    ts.weekday().num_days_from_monday() as usize * HOURS_PER_DAY + ts.hour() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use std::f64::consts::TAU;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    fn daily_shape(h: usize) -> f64 {
        20.0 * (TAU * (h % 24) as f64 / 24.0).sin()
    }

    #[test]
    fn recovers_noise_free_daily_pattern() {
        let values: Vec<f64> = (0..168).map(|h| 100.0 + daily_shape(h)).collect();
        let series = Series::new("Adana", t0(), values);
        let points = AdditiveForecast::default().forecast(&series, 72).unwrap();

        assert_eq!(points.len(), 72);
        assert_eq!(points[0].timestamp, t0() + Duration::hours(168));
        for (k, p) in points.iter().enumerate() {
            let expected = 100.0 + daily_shape(168 + k);
            assert!((p.predicted_consumption - expected).abs() < 1e-6, "hour {k}");
            assert!((p.upper_bound - p.lower_bound).abs() < 1e-6);
        }
    }

    #[test]
    fn extrapolates_linear_trend() {
        let values: Vec<f64> = (0..96).map(|h| 50.0 + 0.5 * h as f64).collect();
        let series = Series::new("Hatay", t0(), values);
        let points = AdditiveForecast::default().forecast(&series, 4).unwrap();
        for (k, p) in points.iter().enumerate() {
            let expected = 50.0 + 0.5 * (96 + k) as f64;
            assert!((p.predicted_consumption - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn interval_widens_with_horizon() {
        let values: Vec<f64> = (0..168)
            .map(|h| {
                let swing = if h % 2 == 0 { 3.0 } else { -3.0 };
                100.0 + daily_shape(h) + swing * ((h / 24) as f64 - 3.0)
            })
            .collect();
        let series = Series::new("Sivas", t0(), values);
        let points = AdditiveForecast::default().forecast(&series, 72).unwrap();
        let width = |p: &ForecastPoint| p.upper_bound - p.lower_bound;
        assert!(width(&points[0]) > 0.0);
        assert!(width(&points[71]) > width(&points[0]));
    }

    #[test]
    fn weekly_component_needs_two_weeks() {
        // Weekend hours are 30 kWh lower.
        let values: Vec<f64> = (0..336)
            .map(|h| {
                let day = (t0() + Duration::hours(h as i64)).weekday();
                let weekend = day.num_days_from_monday() >= 5;
                100.0 + daily_shape(h) - if weekend { 30.0 } else { 0.0 }
            })
            .collect();
        let series = Series::new("Edirne", t0(), values);

        let weekly = AdditiveForecast::new(DEFAULT_INTERVAL_Z, true)
            .forecast(&series, 168)
            .unwrap();
        let flat = AdditiveForecast::new(DEFAULT_INTERVAL_Z, false)
            .forecast(&series, 168)
            .unwrap();

        // Forecast starts on a Monday; day 5 is Saturday.
        let saturday_noon = 5 * 24 + 12;
        let monday_noon = 12;
        assert!(
            weekly[monday_noon].predicted_consumption - weekly[saturday_noon].predicted_consumption
                > 25.0
        );
        assert!(
            (flat[monday_noon].predicted_consumption - flat[saturday_noon].predicted_consumption)
                .abs()
                < 10.0
        );
    }

    #[test]
    fn rejects_short_and_non_finite_history() {
        let short = Series::new("Kars", t0(), vec![1.0; 47]);
        assert!(matches!(
            AdditiveForecast::default().forecast(&short, 1),
            Err(ForecastError::InsufficientHistory { required: 48, .. })
        ));

        let mut values = vec![1.0; 48];
        values[10] = f64::NAN;
        let bad = Series::new("Kars", t0(), values);
        assert_eq!(
            AdditiveForecast::default().forecast(&bad, 1),
            Err(ForecastError::NonFinite {
                timestamp: t0() + Duration::hours(10)
            })
        );
    }
}
