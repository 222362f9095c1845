//! Per-city z-score anomaly detection.
//!
//! Statistics are computed independently for every city over its full
//! series; a reading is anomalous when its absolute z-score is strictly
//! greater than the detector threshold.

/// Per-city anomaly summary.
pub mod report;
/// Z-score statistics and thresholding.
pub mod zscore;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::series::{Dataset, Reading, Series};

pub use report::{AnomalyReport, CityAnomalySummary};
pub use zscore::{DEFAULT_THRESHOLD, SeriesStats, detect_anomalies, z_scores};

/// Flags anomalous readings with a fixed threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyDetector {
    threshold: f64,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl AnomalyDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Scores one city's series. The input is left untouched.
    pub fn annotate(&self, series: &Series) -> AnnotatedSeries {
        let stats = SeriesStats::from_values(series.values());
        let z_scores: Vec<f64> = series.values().iter().map(|&v| stats.z_score(v)).collect();
        let is_anomaly: Vec<bool> = z_scores.iter().map(|z| z.abs() > self.threshold).collect();

        let annotated = AnnotatedSeries {
            series: series.clone(),
            stats,
            z_scores,
            is_anomaly,
        };
        debug!(
            city = series.city(),
            mean = stats.mean,
            std_dev = stats.std_dev,
            anomalies = annotated.anomaly_count(),
            "scored series"
        );
        annotated
    }

    /// Scores every city of `dataset` in its own pass.
    pub fn annotate_dataset(&self, dataset: &Dataset) -> Vec<AnnotatedSeries> {
        dataset.series().iter().map(|s| self.annotate(s)).collect()
    }
}

/// A series together with its z-scores and anomaly flags.
///
/// `z_scores` and `is_anomaly` are parallel to `series.values()`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedSeries {
    pub series: Series,
    pub stats: SeriesStats,
    pub z_scores: Vec<f64>,
    pub is_anomaly: Vec<bool>,
}

impl AnnotatedSeries {
    pub fn city(&self) -> &str {
        self.series.city()
    }

    pub fn anomaly_count(&self) -> usize {
        self.is_anomaly.iter().filter(|f| **f).count()
    }

    /// Anomalous readings in timestamp order.
    pub fn anomalies(&self) -> impl Iterator<Item = Reading> + '_ {
        self.series
            .readings()
            .zip(&self.is_anomaly)
            .filter(|(_, flagged)| **flagged)
            .map(|(r, _)| r)
    }

    /// Restricts the annotation to `[from, to]`.
    ///
    /// Flags and z-scores keep the values computed over the full series.
    pub fn window(&self, from: NaiveDateTime, to: NaiveDateTime) -> AnnotatedSeries {
        let range = self.series.index_range(from, to);
        AnnotatedSeries {
            series: self.series.window(from, to),
            stats: self.stats,
            z_scores: self.z_scores[range.clone()].to_vec(),
            is_anomaly: self.is_anomaly[range].to_vec(),
        }
    }
}
