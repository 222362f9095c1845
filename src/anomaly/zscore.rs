//! Z-score statistics and thresholding.

use serde::Serialize;

/// Default absolute z-score above which a reading is anomalous.
pub const DEFAULT_THRESHOLD: f64 = 2.0;

/// Mean and population standard deviation of one series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStats {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation (divides by `count`).
    pub std_dev: f64,
}

impl SeriesStats {
    /// Computes statistics over all `values`.
    ///
    /// An empty slice yields a zero mean and zero deviation.
    pub fn from_values(values: &[f64]) -> Self {
        let count = values.len();
        if count == 0 {
            return Self {
                count,
                mean: 0.0,
                std_dev: 0.0,
            };
        }
        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            count,
            mean,
            std_dev: variance.sqrt(),
        }
    }

    /// Whether z-scores are undefined for this series.
    ///
    /// True for fewer than two values or a zero or non-finite deviation.
    pub fn is_degenerate(&self) -> bool {
        self.count < 2 || self.std_dev == 0.0 || !self.std_dev.is_finite()
    }

    /// Standardized distance of `value` from the mean; 0 when degenerate.
    pub fn z_score(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            0.0
        } else {
            (value - self.mean) / self.std_dev
        }
    }
}

/// Z-score of every value against the statistics of the whole slice.
pub fn z_scores(values: &[f64]) -> Vec<f64> {
    let stats = SeriesStats::from_values(values);
    values.iter().map(|&v| stats.z_score(v)).collect()
}

/// Flags values whose absolute z-score is strictly greater than `threshold`.
///
/// The result is parallel to `values`.
///
/// # Examples
///
/// ```
/// use meter_analytics::anomaly::detect_anomalies;
///
/// let mut values = vec![100.0; 48];
/// values[24] = 100_000.0;
/// let flags = detect_anomalies(&values, 2.0);
/// assert!(flags[24]);
/// assert_eq!(flags.iter().filter(|f| **f).count(), 1);
/// ```
pub fn detect_anomalies(values: &[f64], threshold: f64) -> Vec<bool> {
    z_scores(values)
        .into_iter()
        .map(|z| z.abs() > threshold)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_series_has_no_anomalies() {
        let values = vec![42.0; 100];
        assert!(z_scores(&values).iter().all(|z| *z == 0.0));
        assert!(detect_anomalies(&values, DEFAULT_THRESHOLD).iter().all(|f| !f));
    }

    #[test]
    fn large_baseline_keeps_flags() {
        let mut values = vec![0.0; 48];
        values[47] = 1.0;
        let shifted: Vec<f64> = values.iter().map(|v| v + 1e12).collect();
        let flags = detect_anomalies(&values, DEFAULT_THRESHOLD);
        assert!(flags[47]);
        assert_eq!(flags, detect_anomalies(&shifted, DEFAULT_THRESHOLD));
        assert!((z_scores(&shifted)[47] - 47.0_f64.sqrt()).abs() < 0.1);
    }

    #[test]
    fn empty_and_single_value() {
        assert!(detect_anomalies(&[], 2.0).is_empty());
        assert_eq!(detect_anomalies(&[5.0], 2.0), vec![false]);
    }

    #[test]
    fn population_std_dev() {
        let stats = SeriesStats::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.std_dev, 2.0);
    }

    #[test]
    fn threshold_is_strict() {
        // mean 2, population std-dev 4: the 10 sits at exactly z = 2.
        let values = [0.0, 0.0, 0.0, 10.0, 0.0];
        let z = z_scores(&values);
        assert!((z[3] - 2.0).abs() < 1e-12);
        assert!(detect_anomalies(&values, 2.0).iter().all(|f| !f));
        assert!(detect_anomalies(&values, 1.99)[3]);
    }

    #[test]
    fn single_outlier_masks_itself_in_short_series() {
        // For n points the largest |z| is sqrt(n - 1), here exactly 2.
        let values = [0.0, 0.0, 0.0, 0.0, 1000.0];
        let max_z = z_scores(&values).iter().fold(0.0_f64, |m, z| m.max(z.abs()));
        assert_eq!(max_z, 2.0);
        assert!(detect_anomalies(&values, 2.0).iter().all(|f| !f));
    }

    #[test]
    fn affine_transform_preserves_flags() {
        let values: Vec<f64> = (0..96)
            .map(|i| 100.0 + 20.0 * (i as f64 * 0.26).sin() + if i == 40 { 90.0 } else { 0.0 })
            .collect();
        let scaled: Vec<f64> = values.iter().map(|v| 3.5 * v - 250.0).collect();
        assert_eq!(
            detect_anomalies(&values, 2.0),
            detect_anomalies(&scaled, 2.0)
        );
        for (a, b) in z_scores(&values).iter().zip(z_scores(&scaled)) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn non_finite_std_dev_is_degenerate() {
        let stats = SeriesStats::from_values(&[f64::MAX, -f64::MAX, f64::MAX]);
        assert_eq!(stats.z_score(1.0), 0.0);
    }
}
