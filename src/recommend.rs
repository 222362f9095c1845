//! Load-shifting suggestions derived from a forecast.

use chrono::Timelike;
use serde::Serialize;
use thiserror::Error;

use crate::series::ForecastPoint;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecommendError {
    #[error("cannot derive suggestions from an empty forecast")]
    EmptyForecast,
}

/// Part of the day in which predicted demand peaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakBand {
    /// 11:00 to 16:59.
    Midday,
    /// 17:00 to 22:59.
    Evening,
    /// 06:00 to 10:59.
    Morning,
    /// Night or a flat profile.
    Other,
}

impl PeakBand {
    pub fn of_hour(hour: usize) -> Self {
        match hour {
            11..=16 => Self::Midday,
            17..=22 => Self::Evening,
            6..=10 => Self::Morning,
            _ => Self::Other,
        }
    }
}

/// Peak and off-peak hour of day of a forecast.
///
/// Predictions are averaged per hour of day; ties resolve to the earliest
/// hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourlyOutlook {
    pub peak_hour: usize,
    pub off_peak_hour: usize,
}

impl HourlyOutlook {
    /// # Errors
    ///
    /// Returns [`RecommendError::EmptyForecast`] for an empty slice.
    pub fn from_forecast(points: &[ForecastPoint]) -> Result<Self, RecommendError> {
        let mut sums = [0.0_f64; 24];
        let mut counts = [0usize; 24];
        for p in points {
            let h = p.timestamp.hour() as usize;
            sums[h] += p.predicted_consumption;
            counts[h] += 1;
        }

        let means: Vec<(usize, f64)> = (0..24)
            .filter(|&h| counts[h] > 0)
            .map(|h| (h, sums[h] / counts[h] as f64))
            .collect();
        let first = *means.first().ok_or(RecommendError::EmptyForecast)?;

        let (peak_hour, _) = means
            .iter()
            .fold(first, |best, &m| if m.1 > best.1 { m } else { best });
        let (off_peak_hour, _) = means
            .iter()
            .fold(first, |best, &m| if m.1 < best.1 { m } else { best });

        Ok(Self {
            peak_hour,
            off_peak_hour,
        })
    }

    pub fn band(&self) -> PeakBand {
        PeakBand::of_hour(self.peak_hour)
    }

    /// The two user-facing suggestions for this outlook.
    pub fn suggestions(&self) -> [String; 2] {
        let peak = window(self.peak_hour);
        let off = window(self.off_peak_hour);
        let off_start = format!("{:02}:00", (self.off_peak_hour + 23) % 24);
        match self.band() {
            PeakBand::Midday => [
                format!(
                    "Shift laundry and dishwasher runs to the {off} night window to benefit from low tariffs."
                ),
                format!(
                    "Reduce midday AC usage during {peak} by pre-cooling your home in the morning."
                ),
            ],
            PeakBand::Evening => [
                format!(
                    "Cook dinner with smaller appliances or earlier to avoid the {peak} peak window."
                ),
                format!("Run high-load devices during {off} overnight when demand is lowest."),
            ],
            PeakBand::Morning => [
                format!(
                    "Prepare hot water after {off_start} when rates drop, avoiding the {peak} morning spike."
                ),
                format!(
                    "Delay starting energy-hungry appliances until the off-peak hours around {off}."
                ),
            ],
            PeakBand::Other => [
                format!(
                    "Take advantage of consistently low demand by scheduling appliances during {off} off-peak hours."
                ),
                "Maintain efficiency by switching off standby electronics; no significant peaks are expected."
                    .to_string(),
            ],
        }
    }
}

/// Two suggestions for shifting load away from the forecast peak.
///
/// # Errors
///
/// Returns [`RecommendError::EmptyForecast`] for an empty forecast.
pub fn suggestions(points: &[ForecastPoint]) -> Result<[String; 2], RecommendError> {
    Ok(HourlyOutlook::from_forecast(points)?.suggestions())
}

/// `HH:00–HH:00` window from one hour before to one hour after `hour`.
fn window(hour: usize) -> String {
    format!("{:02}:00–{:02}:00", (hour + 23) % 24, (hour + 1) % 24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn forecast(shape: impl Fn(usize) -> f64) -> Vec<ForecastPoint> {
        let t0 = NaiveDate::from_ymd_opt(2024, 1, 8)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        (0..72)
            .map(|k| {
                let y = shape(k % 24);
                ForecastPoint {
                    timestamp: t0 + Duration::hours(k as i64),
                    predicted_consumption: y,
                    lower_bound: y - 1.0,
                    upper_bound: y + 1.0,
                }
            })
            .collect()
    }

    #[test]
    fn midday_peak() {
        let points = forecast(|h| if h == 13 { 200.0 } else if h == 3 { 50.0 } else { 100.0 });
        let outlook = HourlyOutlook::from_forecast(&points).unwrap();
        assert_eq!(outlook.peak_hour, 13);
        assert_eq!(outlook.off_peak_hour, 3);
        assert_eq!(outlook.band(), PeakBand::Midday);
        let [first, second] = outlook.suggestions();
        assert!(first.contains("02:00–04:00"), "{first}");
        assert!(second.contains("12:00–14:00"), "{second}");
    }

    #[test]
    fn windows_wrap_midnight() {
        let points = forecast(|h| if h == 0 { 10.0 } else if h == 19 { 300.0 } else { 100.0 });
        let [first, second] = suggestions(&points).unwrap();
        assert!(first.contains("18:00–20:00"), "{first}");
        assert!(second.contains("23:00–01:00"), "{second}");
    }

    #[test]
    fn flat_profile_falls_back_to_other() {
        let outlook = HourlyOutlook::from_forecast(&forecast(|_| 100.0)).unwrap();
        assert_eq!(outlook.peak_hour, 0);
        assert_eq!(outlook.band(), PeakBand::Other);
        assert!(outlook.suggestions()[1].contains("standby"));
    }

    #[test]
    fn bands() {
        assert_eq!(PeakBand::of_hour(6), PeakBand::Morning);
        assert_eq!(PeakBand::of_hour(10), PeakBand::Morning);
        assert_eq!(PeakBand::of_hour(16), PeakBand::Midday);
        assert_eq!(PeakBand::of_hour(22), PeakBand::Evening);
        assert_eq!(PeakBand::of_hour(23), PeakBand::Other);
    }

    #[test]
    fn empty_forecast_is_an_error() {
        assert_eq!(suggestions(&[]), Err(RecommendError::EmptyForecast));
    }
}
