//! Post-hoc anomaly summary over annotated cities.

use std::fmt;

use serde::Serialize;

use super::AnnotatedSeries;

/// Summary figures for one city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityAnomalySummary {
    pub city: String,
    pub readings: usize,
    pub anomalies: usize,
    pub mean_kwh: f64,
    pub std_dev_kwh: f64,
    pub min_kwh: f64,
    pub max_kwh: f64,
}

/// Aggregate anomaly figures for a whole dataset.
///
/// Computed from already annotated series so the report always agrees with
/// what the dashboard highlights.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyReport {
    pub threshold: f64,
    pub cities: Vec<CityAnomalySummary>,
}

impl AnomalyReport {
    pub fn from_annotated(annotated: &[AnnotatedSeries], threshold: f64) -> Self {
        let cities = annotated
            .iter()
            .map(|a| {
                let values = a.series.values();
                let (min, max) = values
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                        (lo.min(v), hi.max(v))
                    });
                let (min, max) = if values.is_empty() { (0.0, 0.0) } else { (min, max) };
                CityAnomalySummary {
                    city: a.city().to_string(),
                    readings: values.len(),
                    anomalies: a.anomaly_count(),
                    mean_kwh: a.stats.mean,
                    std_dev_kwh: a.stats.std_dev,
                    min_kwh: min,
                    max_kwh: max,
                }
            })
            .collect();
        Self { threshold, cities }
    }

    pub fn total_readings(&self) -> usize {
        self.cities.iter().map(|c| c.readings).sum()
    }

    pub fn total_anomalies(&self) -> usize {
        self.cities.iter().map(|c| c.anomalies).sum()
    }
}

impl fmt::Display for AnomalyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Anomaly Report (|z| > {}) ---", self.threshold)?;
        writeln!(
            f,
            "{:<16} {:>8} {:>9} {:>10} {:>9} {:>10} {:>10}",
            "city", "readings", "anomalies", "mean", "std", "min", "max"
        )?;
        for c in &self.cities {
            writeln!(
                f,
                "{:<16} {:>8} {:>9} {:>10.2} {:>9.2} {:>10.2} {:>10.2}",
                c.city, c.readings, c.anomalies, c.mean_kwh, c.std_dev_kwh, c.min_kwh, c.max_kwh
            )?;
        }
        write!(
            f,
            "Total: {} anomalies in {} readings",
            self.total_anomalies(),
            self.total_readings()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::AnomalyDetector;
    use crate::series::Series;
    use chrono::NaiveDate;

    fn annotated(city: &str, values: Vec<f64>) -> AnnotatedSeries {
        let t0 = NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        AnomalyDetector::default().annotate(&Series::new(city, t0, values))
    }

    #[test]
    fn counts_and_extremes() {
        let mut spiky = vec![10.0; 30];
        spiky[3] = 400.0;
        let report = AnomalyReport::from_annotated(
            &[annotated("Rize", spiky), annotated("Sinop", vec![5.0, 7.0])],
            2.0,
        );
        assert_eq!(report.cities[0].anomalies, 1);
        assert_eq!(report.cities[0].max_kwh, 400.0);
        assert_eq!(report.cities[1].min_kwh, 5.0);
        assert_eq!(report.total_readings(), 32);
        assert_eq!(report.total_anomalies(), 1);
    }

    #[test]
    fn empty_series_reports_zeros() {
        let report = AnomalyReport::from_annotated(&[annotated("Kilis", Vec::new())], 2.0);
        assert_eq!(report.cities[0].min_kwh, 0.0);
        assert_eq!(report.cities[0].max_kwh, 0.0);
    }

    #[test]
    fn display_lists_every_city() {
        let report = AnomalyReport::from_annotated(
            &[annotated("Ordu", vec![1.0; 5]), annotated("Tokat", vec![2.0; 5])],
            2.0,
        );
        let text = report.to_string();
        assert!(text.contains("Ordu"));
        assert!(text.contains("Tokat"));
        assert!(text.ends_with("Total: 0 anomalies in 10 readings"));
    }
}
