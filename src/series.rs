//! Core time-series types: readings, hourly per-city series, datasets and
//! forecast points.

use std::fmt;
use std::ops::Range;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Spacing between consecutive readings of a series.
pub fn step() -> Duration {
    Duration::hours(1)
}

/// One hourly consumption reading for a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// City the meter aggregate belongs to.
    pub city: String,
    /// Start of the hour the reading covers.
    pub timestamp: NaiveDateTime,
    /// Consumption over the hour (kWh).
    pub consumption: f64,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<14} {} | {:>10.2} kWh",
            self.city,
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.consumption
        )
    }
}

/// Violations of the hourly-series invariant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    /// Two readings of the same city share a timestamp.
    #[error("series `{city}`: duplicate reading at {timestamp}")]
    Duplicate {
        city: String,
        timestamp: NaiveDateTime,
    },
    /// The next reading is not exactly one hour after the previous one.
    #[error("series `{city}`: expected reading at {expected}, found {found}")]
    Gap {
        city: String,
        expected: NaiveDateTime,
        found: NaiveDateTime,
    },
    /// A consumption value is NaN or infinite.
    #[error("series `{city}`: non-finite consumption at {timestamp}")]
    NonFinite {
        city: String,
        timestamp: NaiveDateTime,
    },
    /// The same city appears twice in a dataset.
    #[error("dataset contains city `{0}` more than once")]
    DuplicateCity(String),
}

/// Hourly consumption series for one city.
///
/// Timestamps are implicit: value `i` belongs to `start + i` hours, so a
/// `Series` is evenly spaced and gap-free by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    city: String,
    start: NaiveDateTime,
    values: Vec<f64>,
}

impl Series {
    /// Creates a series whose first value belongs to `start`.
    pub fn new(city: impl Into<String>, start: NaiveDateTime, values: Vec<f64>) -> Self {
        Self {
            city: city.into(),
            start,
            values,
        }
    }

    /// Builds a series from `(timestamp, consumption)` pairs.
    ///
    /// Pairs are sorted by timestamp first; the result must then be strictly
    /// increasing in one-hour steps with finite values.
    ///
    /// # Errors
    ///
    /// Returns a [`SeriesError`] on duplicates, gaps or non-finite values.
    pub fn from_points(
        city: impl Into<String>,
        mut points: Vec<(NaiveDateTime, f64)>,
    ) -> Result<Self, SeriesError> {
        let city = city.into();
        points.sort_by_key(|(ts, _)| *ts);

        let Some(&(start, _)) = points.first() else {
            return Ok(Self::new(city, NaiveDateTime::default(), Vec::new()));
        };

        let mut values = Vec::with_capacity(points.len());
        let mut expected = start;
        for (ts, value) in points {
            if ts < expected {
                return Err(SeriesError::Duplicate {
                    city,
                    timestamp: ts,
                });
            }
            if ts != expected {
                return Err(SeriesError::Gap {
                    city,
                    expected,
                    found: ts,
                });
            }
            if !value.is_finite() {
                return Err(SeriesError::NonFinite {
                    city,
                    timestamp: ts,
                });
            }
            values.push(value);
            expected = ts + step();
        }

        Ok(Self::new(city, start, values))
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    /// Timestamp of the first value.
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Timestamp of the last value, or `None` for an empty series.
    pub fn end(&self) -> Option<NaiveDateTime> {
        self.values
            .len()
            .checked_sub(1)
            .map(|last| self.timestamp_at(last))
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Timestamp of the value at `index`.
    pub fn timestamp_at(&self, index: usize) -> NaiveDateTime {
        self.start + Duration::hours(index as i64)
    }

    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        (0..self.values.len()).map(|i| self.timestamp_at(i))
    }

    /// Iterates the series as owned [`Reading`]s in timestamp order.
    pub fn readings(&self) -> impl Iterator<Item = Reading> + '_ {
        self.values.iter().enumerate().map(|(i, &consumption)| Reading {
            city: self.city.clone(),
            timestamp: self.timestamp_at(i),
            consumption,
        })
    }

    /// Index range of the values whose timestamps fall in `[from, to]`.
    ///
    /// Returns an empty range when the window does not overlap the series.
    pub fn index_range(&self, from: NaiveDateTime, to: NaiveDateTime) -> Range<usize> {
        if self.values.is_empty() || from > to || to < self.start {
            return 0..0;
        }
        let first = (from - self.start).num_hours().max(0);
        let first = if self.timestamp_at(first as usize) < from {
            first + 1
        } else {
            first
        };
        let last = (to - self.start).num_hours();
        if last < 0 {
            return 0..0;
        }
        let lo = (first as usize).min(self.values.len());
        let hi = (last as usize + 1).min(self.values.len());
        if lo >= hi { 0..0 } else { lo..hi }
    }

    /// Sub-series covering timestamps in `[from, to]` (inclusive).
    pub fn window(&self, from: NaiveDateTime, to: NaiveDateTime) -> Series {
        let range = self.index_range(from, to);
        let start = if range.is_empty() {
            self.start
        } else {
            self.timestamp_at(range.start)
        };
        Series::new(self.city.clone(), start, self.values[range].to_vec())
    }

    /// Arithmetic mean, or `None` for an empty series.
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
        }
    }
}

/// All city series of one simulation run, in city order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    series: Vec<Series>,
}

impl Dataset {
    /// Creates a dataset, rejecting repeated cities.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::DuplicateCity`] if a city occurs twice.
    pub fn new(series: Vec<Series>) -> Result<Self, SeriesError> {
        for (i, s) in series.iter().enumerate() {
            if series[..i].iter().any(|other| other.city == s.city) {
                return Err(SeriesError::DuplicateCity(s.city.clone()));
            }
        }
        Ok(Self { series })
    }

    /// Wraps series whose cities the caller already deduplicated.
    pub(crate) fn from_unique(series: Vec<Series>) -> Self {
        Self { series }
    }

    /// Groups flat readings into per-city series.
    ///
    /// Cities keep their order of first appearance.
    ///
    /// # Errors
    ///
    /// Returns a [`SeriesError`] if any city's readings break the hourly
    /// invariant.
    pub fn from_readings(readings: impl IntoIterator<Item = Reading>) -> Result<Self, SeriesError> {
        let mut grouped: Vec<(String, Vec<(NaiveDateTime, f64)>)> = Vec::new();
        for r in readings {
            match grouped.iter_mut().find(|(city, _)| *city == r.city) {
                Some((_, points)) => points.push((r.timestamp, r.consumption)),
                None => grouped.push((r.city, vec![(r.timestamp, r.consumption)])),
            }
        }

        let series = grouped
            .into_iter()
            .map(|(city, points)| Series::from_points(city, points))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { series })
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn into_series(self) -> Vec<Series> {
        self.series
    }

    /// Looks up a city's series by exact name.
    pub fn get(&self, city: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.city == city)
    }

    pub fn cities(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(Series::city)
    }

    /// Number of cities.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Total number of readings across cities.
    pub fn row_count(&self) -> usize {
        self.series.iter().map(Series::len).sum()
    }

    /// Flattened readings, city-major then by timestamp.
    pub fn readings(&self) -> impl Iterator<Item = Reading> + '_ {
        self.series.iter().flat_map(Series::readings)
    }

    /// Earliest and latest timestamp over all cities.
    pub fn time_span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let first = self
            .series
            .iter()
            .filter(|s| !s.is_empty())
            .map(Series::start)
            .min()?;
        let last = self.series.iter().filter_map(Series::end).max()?;
        Some((first, last))
    }
}

/// One predicted hour with its uncertainty interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: NaiveDateTime,
    pub predicted_consumption: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    #[test]
    fn from_points_sorts_and_validates() {
        let series = Series::from_points(
            "Ankara",
            vec![(ts(1, 2), 3.0), (ts(1, 0), 1.0), (ts(1, 1), 2.0)],
        )
        .unwrap();
        assert_eq!(series.start(), ts(1, 0));
        assert_eq!(series.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(series.end(), Some(ts(1, 2)));
    }

    #[test]
    fn from_points_rejects_gap() {
        let err = Series::from_points("Izmir", vec![(ts(1, 0), 1.0), (ts(1, 2), 2.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::Gap { .. }));
    }

    #[test]
    fn from_points_rejects_duplicate() {
        let err = Series::from_points("Izmir", vec![(ts(1, 0), 1.0), (ts(1, 0), 2.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::Duplicate { .. }));
    }

    #[test]
    fn from_points_rejects_nan() {
        let err = Series::from_points("Bursa", vec![(ts(1, 0), f64::NAN)]).unwrap_err();
        assert!(matches!(err, SeriesError::NonFinite { .. }));
    }

    #[test]
    fn window_is_inclusive() {
        let series = Series::new("Konya", ts(1, 0), (0..48).map(f64::from).collect());
        let w = series.window(ts(1, 22), ts(2, 1));
        assert_eq!(w.start(), ts(1, 22));
        assert_eq!(w.values(), &[22.0, 23.0, 24.0, 25.0]);
    }

    #[test]
    fn window_outside_series_is_empty() {
        let series = Series::new("Konya", ts(2, 0), vec![1.0; 24]);
        assert!(series.window(ts(1, 0), ts(1, 23)).is_empty());
        assert!(series.window(ts(3, 0), ts(3, 5)).is_empty());
        assert!(series.window(ts(2, 5), ts(2, 1)).is_empty());
    }

    #[test]
    fn dataset_rejects_duplicate_city() {
        let a = Series::new("Adana", ts(1, 0), vec![1.0]);
        let err = Dataset::new(vec![a.clone(), a]).unwrap_err();
        assert_eq!(err, SeriesError::DuplicateCity("Adana".into()));
    }

    #[test]
    fn dataset_from_readings_keeps_city_order() {
        let readings = vec![
            Reading { city: "Mersin".into(), timestamp: ts(1, 0), consumption: 1.0 },
            Reading { city: "Adana".into(), timestamp: ts(1, 0), consumption: 2.0 },
            Reading { city: "Mersin".into(), timestamp: ts(1, 1), consumption: 3.0 },
        ];
        let dataset = Dataset::from_readings(readings).unwrap();
        assert_eq!(dataset.cities().collect::<Vec<_>>(), vec!["Mersin", "Adana"]);
        assert_eq!(dataset.row_count(), 3);
        assert_eq!(dataset.time_span(), Some((ts(1, 0), ts(1, 1))));
    }
}
