//! Config-driven simulation runs.

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{info, warn};

use crate::anomaly::{AnomalyDetector, AnomalyReport};
use crate::config::{AnalyticsConfig, ConfigError};
use crate::io::store::{self, StoreError};
use crate::io::totals::AnnualTotals;
use crate::series::Dataset;
use crate::sim::Simulator;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Output of [`run`].
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub dataset: Dataset,
    pub report: AnomalyReport,
}

/// Simulates the configured cities without touching the data file.
///
/// Annual totals are applied when `data.totals_path` is set and the file
/// exists; a missing totals file only logs a warning.
///
/// # Errors
///
/// Returns [`RunError::Config`] for an unresolvable city set and
/// [`RunError::Store`] for an unreadable totals file.
pub fn simulate(config: &AnalyticsConfig, now: NaiveDateTime) -> Result<Dataset, RunError> {
    let catalog = config.catalog()?;
    let totals = load_totals(config)?;
    let params = config.simulation_params(now);
    let names: Vec<&str> = catalog.names().collect();
    Ok(Simulator::new(params).generate(&names, &totals))
}

/// Simulates, overwrites the data file and scores the result.
///
/// # Errors
///
/// Returns a [`RunError`] if simulation or the write fails.
pub fn run(config: &AnalyticsConfig, now: NaiveDateTime) -> Result<RunOutput, RunError> {
    let dataset = simulate(config, now)?;
    store::save_dataset(&dataset, &config.data.path)?;

    let detector = AnomalyDetector::new(config.anomaly.threshold);
    let annotated = detector.annotate_dataset(&dataset);
    let report = AnomalyReport::from_annotated(&annotated, detector.threshold());
    info!(
        anomalies = report.total_anomalies(),
        readings = report.total_readings(),
        "simulation run complete"
    );
    Ok(RunOutput { dataset, report })
}

fn load_totals(config: &AnalyticsConfig) -> Result<AnnualTotals, StoreError> {
    let Some(path) = &config.data.totals_path else {
        return Ok(AnnualTotals::default());
    };
    match AnnualTotals::load(path) {
        Err(StoreError::Missing { path }) => {
            warn!(path = %path.display(), "annual totals file not found, using unscaled profile");
            Ok(AnnualTotals::default())
        }
        other => other,
    }
}
