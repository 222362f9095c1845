//! Long-lived dashboard session: configuration, city catalog and loaded data.

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::state::DashboardState;
use super::view::{self, DashboardView};
use crate::anomaly::{AnnotatedSeries, AnomalyDetector};
use crate::catalog::CityCatalog;
use crate::config::{AnalyticsConfig, ConfigError};
use crate::forecast::{ForecastError, ForecastModel, Forecaster};
use crate::io::export::{forecast_file_name, write_forecast_csv};
use crate::io::store::{self, StoreError};
use crate::runner::{self, RunError};
use crate::series::{Dataset, ForecastPoint};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("no consumption data loaded; regenerate first")]
    NoData,
    #[error("unknown city \"{0}\"")]
    UnknownCity(String),
    #[error(transparent)]
    Forecast(#[from] ForecastError),
}

impl From<RunError> for SessionError {
    fn from(e: RunError) -> Self {
        match e {
            RunError::Config(e) => Self::Config(e),
            RunError::Store(e) => Self::Store(e),
        }
    }
}

/// Whether the session has data to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DataStatus {
    /// Data is loaded. `stale` is set when the annual totals file changed
    /// after the data file was written.
    Ready { stale: bool },
    /// The data file is missing or unreadable; regeneration is offered.
    Unavailable { reason: String },
}

/// Owns everything a dashboard front-end reads.
///
/// Opening never fails on a bad data file; the session reports
/// [`DataStatus::Unavailable`] instead and can be regenerated in place.
#[derive(Debug)]
pub struct Session {
    config: AnalyticsConfig,
    catalog: CityCatalog,
    detector: AnomalyDetector,
    forecaster: ForecastModel,
    dataset: Dataset,
    annotated: Vec<AnnotatedSeries>,
    status: DataStatus,
    seed: u64,
}

impl Session {
    /// Resolves the city set and loads the persisted data file.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] if the configured city set is
    /// unknown. File problems are reported through [`Session::status`].
    pub fn open(config: AnalyticsConfig) -> Result<Self, SessionError> {
        let catalog = config.catalog()?;
        let mut session = Self {
            detector: AnomalyDetector::new(config.anomaly.threshold),
            forecaster: ForecastModel::from_config(&config.forecast),
            seed: config.simulation.seed,
            catalog,
            config,
            dataset: Dataset::default(),
            annotated: Vec::new(),
            status: DataStatus::Unavailable {
                reason: "not loaded".to_string(),
            },
        };
        session.reload();
        Ok(session)
    }

    /// Re-reads the data file, replacing what is loaded.
    ///
    /// On failure the previous data is dropped and the status explains why.
    pub fn reload(&mut self) -> &DataStatus {
        let path = &self.config.data.path;
        match store::load_dataset(path) {
            Ok(dataset) => {
                let stale = self
                    .config
                    .data
                    .totals_path
                    .as_deref()
                    .is_some_and(|totals| store::is_stale(path, totals));
                if stale {
                    warn!(path = %path.display(), "annual totals changed after data was generated");
                }
                self.set_dataset(dataset);
                self.status = DataStatus::Ready { stale };
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "consumption data unavailable");
                self.set_dataset(Dataset::default());
                self.status = DataStatus::Unavailable {
                    reason: e.to_string(),
                };
            }
        }
        &self.status
    }

    /// Re-simulates with `seed` (or the current seed), overwrites the data
    /// file and reloads.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if simulating or writing fails. The
    /// previously loaded data stays in place.
    pub fn regenerate(&mut self, seed: Option<u64>) -> Result<&DataStatus, SessionError> {
        self.regenerate_at(seed, Local::now().naive_local())
    }

    /// [`Session::regenerate`] with an explicit current time for trailing
    /// windows.
    ///
    /// # Errors
    ///
    /// See [`Session::regenerate`].
    pub fn regenerate_at(
        &mut self,
        seed: Option<u64>,
        now: NaiveDateTime,
    ) -> Result<&DataStatus, SessionError> {
        let seed = seed.unwrap_or(self.seed);
        let mut config = self.config.clone();
        config.simulation.seed = seed;

        let dataset = runner::simulate(&config, now)?;
        store::save_dataset(&dataset, &config.data.path)?;
        info!(seed, rows = dataset.row_count(), "regenerated consumption data");

        self.seed = seed;
        self.set_dataset(dataset);
        self.status = DataStatus::Ready { stale: false };
        Ok(&self.status)
    }

    /// Renders `state` against the loaded data.
    pub fn render(&self, state: &DashboardState) -> DashboardView {
        let mut view = view::render(state, &self.annotated, &self.catalog, &self.forecaster);
        if let DataStatus::Unavailable { reason } = &self.status {
            view.status = format!("Data unavailable ({reason}). Regenerate to continue.");
        } else if self.status == (DataStatus::Ready { stale: true }) {
            view.notices.push(
                "Annual totals changed since the data was generated; regenerate to apply them."
                    .to_string(),
            );
        }
        view
    }

    /// Initial selection: the configured default cities that exist, else the
    /// first loaded city.
    pub fn default_state(&self) -> DashboardState {
        let mut cities: Vec<String> = self
            .config
            .dashboard
            .default_cities
            .iter()
            .filter(|c| self.dataset.get(c).is_some())
            .cloned()
            .collect();
        if cities.is_empty() {
            cities.extend(self.dataset.cities().next().map(str::to_string));
        }
        DashboardState::new(cities, self.config.forecast.horizon_hours)
    }

    /// Forecast for one city over the window selected in `state`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoData`], [`SessionError::UnknownCity`] or the
    /// forecaster's error.
    pub fn forecast(
        &self,
        state: &DashboardState,
        city: &str,
    ) -> Result<Vec<ForecastPoint>, SessionError> {
        let span = self.dataset.time_span().ok_or(SessionError::NoData)?;
        let series = self
            .dataset
            .get(city)
            .ok_or_else(|| SessionError::UnknownCity(city.to_string()))?;
        let (from, to) = state.window(span);
        Ok(self
            .forecaster
            .forecast(&series.window(from, to), state.horizon_hours)?)
    }

    /// Forecast CSV download: `(file name, body)`.
    ///
    /// # Errors
    ///
    /// See [`Session::forecast`].
    pub fn forecast_csv(
        &self,
        state: &DashboardState,
        city: &str,
    ) -> Result<(String, Vec<u8>), SessionError> {
        let points = self.forecast(state, city)?;
        let mut body = Vec::new();
        write_forecast_csv(city, &points, &mut body)?;
        Ok((forecast_file_name(city), body))
    }

    pub fn status(&self) -> &DataStatus {
        &self.status
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CityCatalog {
        &self.catalog
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn annotated(&self) -> &[AnnotatedSeries] {
        &self.annotated
    }

    pub fn forecaster(&self) -> &ForecastModel {
        &self.forecaster
    }

    /// Seed of the most recent simulation this session wrote or was
    /// configured with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn set_dataset(&mut self, dataset: Dataset) {
        self.annotated = self.detector.annotate_dataset(&dataset);
        self.dataset = dataset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config(dir: &std::path::Path) -> AnalyticsConfig {
        let mut cfg = AnalyticsConfig::turkey10();
        cfg.simulation.include = vec!["Ankara".into(), "Izmir".into()];
        cfg.dashboard.default_cities = vec!["Izmir".into()];
        cfg.data.path = dir.join("consumption.csv");
        cfg
    }

    #[test]
    fn missing_file_is_unavailable_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::open(config(dir.path())).unwrap();
        assert!(matches!(session.status(), DataStatus::Unavailable { .. }));
        let view = session.render(&session.default_state());
        assert!(view.panels.is_empty());
        assert!(view.status.contains("Regenerate"));
    }

    #[test]
    fn corrupt_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        fs::write(&cfg.data.path, "garbage\n1,2\n").unwrap();
        let session = Session::open(cfg).unwrap();
        assert!(matches!(session.status(), DataStatus::Unavailable { .. }));
    }

    #[test]
    fn regenerate_writes_and_loads() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::open(config(dir.path())).unwrap();
        let status = session.regenerate_at(Some(7), NaiveDateTime::default()).unwrap();
        assert_eq!(status, &DataStatus::Ready { stale: false });
        assert_eq!(session.dataset().row_count(), 2 * 168);
        assert_eq!(session.seed(), 7);

        let reopened = Session::open(session.config().clone()).unwrap();
        assert_eq!(reopened.dataset(), session.dataset());
        assert_eq!(reopened.default_state().cities, vec!["Izmir".to_string()]);
    }

    #[test]
    fn failed_write_keeps_previous_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::open(config(dir.path())).unwrap();
        session.regenerate_at(None, NaiveDateTime::default()).unwrap();
        let before = session.dataset().clone();

        // A directory where the file should go makes the rename fail.
        fs::remove_file(&session.config().data.path).unwrap();
        fs::create_dir(&session.config().data.path).unwrap();
        fs::write(session.config().data.path.join("keep"), "x").unwrap();

        assert!(session.regenerate_at(Some(99), NaiveDateTime::default()).is_err());
        assert_eq!(session.dataset(), &before);
        assert_eq!(session.status(), &DataStatus::Ready { stale: false });
    }

    #[test]
    fn forecast_csv_for_city() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::open(config(dir.path())).unwrap();
        session.regenerate_at(None, NaiveDateTime::default()).unwrap();

        let state = session.default_state();
        let (name, body) = session.forecast_csv(&state, "Izmir").unwrap();
        assert_eq!(name, "Izmir_forecast.csv");
        assert_eq!(String::from_utf8(body).unwrap().lines().count(), 73);

        assert!(matches!(
            session.forecast_csv(&state, "Gotham"),
            Err(SessionError::UnknownCity(_))
        ));
    }

    #[test]
    fn stale_totals_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path());
        let totals = dir.path().join("totals.csv");
        cfg.data.totals_path = Some(totals.clone());

        let mut session = Session::open(cfg).unwrap();
        session.regenerate_at(None, NaiveDateTime::default()).unwrap();

        let later = std::time::SystemTime::now() + std::time::Duration::from_secs(60);
        fs::write(&totals, "il,mwh\nAnkara,1.000\n").unwrap();
        fs::File::options()
            .write(true)
            .open(&totals)
            .and_then(|f| f.set_modified(later))
            .unwrap();

        assert_eq!(session.reload(), &DataStatus::Ready { stale: true });
    }
}
