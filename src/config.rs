//! TOML-based analytics configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;

use crate::catalog::CityCatalog;
use crate::sim::DiurnalProfile;
use crate::sim::clock::HourClock;
use crate::sim::simulator::SimulationParams;

/// Longest simulated window: ten leap years of hourly readings.
pub const MAX_SIMULATION_HOURS: usize = 24 * 366 * 10;

/// Top-level configuration parsed from TOML.
///
/// Every section falls back to its defaults, so an empty file simulates the
/// ten-city set over the trailing week. Load from TOML with
/// [`AnalyticsConfig::from_toml_file`] or pick a preset with
/// [`AnalyticsConfig::from_preset`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyticsConfig {
    /// Simulation window, shape and randomness.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Anomaly thresholding.
    #[serde(default)]
    pub anomaly: AnomalyConfig,
    /// Forecast model selection.
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Flat-file locations.
    #[serde(default)]
    pub data: DataConfig,
    /// Dashboard front-end settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Simulation window, shape and randomness.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// First simulated hour as `"YYYY-MM-DDTHH:MM:SS"`. When absent the
    /// window ends at the current hour.
    pub start: Option<NaiveDateTime>,
    /// Readings per city, 1 to [`MAX_SIMULATION_HOURS`].
    pub hours: usize,
    /// Master random seed.
    pub seed: u64,
    /// Mean hourly consumption (kWh).
    pub base_kwh: f64,
    /// Amplitude of the 24-hour harmonic (kWh).
    pub daily_amplitude: f64,
    /// Amplitude of the 12-hour harmonic (kWh).
    pub semidiurnal_amplitude: f64,
    /// Phase shift of both harmonics (hours).
    pub peak_phase_hours: f64,
    /// Standard deviation of the per-city offset (kWh).
    pub city_offset_stddev: f64,
    /// Standard deviation of hourly noise (kWh).
    pub noise_stddev: f64,
    /// Built-in city set: `"turkey10"` or `"turkey81"`.
    pub cities: String,
    /// Restricts the city set to these names; empty keeps all.
    pub include: Vec<String>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let profile = DiurnalProfile::default();
        Self {
            start: None,
            hours: 168,
            seed: 42,
            base_kwh: profile.base_kwh,
            daily_amplitude: profile.daily_amplitude,
            semidiurnal_amplitude: profile.semidiurnal_amplitude,
            peak_phase_hours: profile.peak_phase_hours,
            city_offset_stddev: 5.0,
            noise_stddev: 3.0,
            cities: "turkey10".to_string(),
            include: Vec::new(),
        }
    }
}

/// Anomaly thresholding.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnomalyConfig {
    /// Absolute z-score a reading must exceed to be flagged.
    pub threshold: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            threshold: crate::anomaly::DEFAULT_THRESHOLD,
        }
    }
}

/// Forecast model selection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// Model type: `"additive"` or `"naive"`.
    pub model: String,
    /// Hours to predict (must be > 0).
    pub horizon_hours: usize,
    /// Normal quantile of the uncertainty interval.
    pub interval_z: f64,
    /// Fit an hour-of-week component when history allows.
    pub weekly_seasonality: bool,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            model: "additive".to_string(),
            horizon_hours: 72,
            interval_z: crate::forecast::DEFAULT_INTERVAL_Z,
            weekly_seasonality: true,
        }
    }
}

/// Flat-file locations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Persisted readings CSV.
    pub path: PathBuf,
    /// Optional annual totals CSV used to scale cities.
    pub totals_path: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/consumption.csv"),
            totals_path: None,
        }
    }
}

/// Dashboard front-end settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Address the web dashboard binds to.
    pub bind: String,
    /// Web dashboard port.
    pub port: u16,
    /// Cities selected on first load; empty selects the first city.
    pub default_cities: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8501,
            default_cities: Vec::new(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.hours"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl AnalyticsConfig {
    /// Available preset names.
    pub const PRESETS: &[&str] = &["turkey10", "turkey81"];

    /// Ten largest cities over the first week of 2024.
    pub fn turkey10() -> Self {
        Self {
            simulation: SimulationConfig {
                start: NaiveDate::from_ymd_opt(2024, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)),
                ..SimulationConfig::default()
            },
            dashboard: DashboardConfig {
                default_cities: vec!["Istanbul".to_string()],
                ..DashboardConfig::default()
            },
            ..Self::default()
        }
    }

    /// All 81 provinces over the trailing week.
    pub fn turkey81() -> Self {
        Self {
            simulation: SimulationConfig {
                cities: "turkey81".to_string(),
                ..SimulationConfig::default()
            },
            data: DataConfig {
                path: PathBuf::from("data/consumption_81.csv"),
                totals_path: Some(PathBuf::from("data/annual_totals.csv")),
            },
            dashboard: DashboardConfig {
                default_cities: vec!["Istanbul".to_string(), "Ankara".to_string()],
                ..DashboardConfig::default()
            },
            ..Self::default()
        }
    }

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "turkey10" => Ok(Self::turkey10()),
            "turkey81" => Ok(Self::turkey81()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Resolves the configured city set.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for an unknown built-in set or an `include`
    /// entry missing from it.
    pub fn catalog(&self) -> Result<CityCatalog, ConfigError> {
        let s = &self.simulation;
        let full = CityCatalog::builtin(&s.cities).ok_or_else(|| {
            ConfigError::new(
                "simulation.cities",
                format!(
                    "unknown city set \"{}\", available: {}",
                    s.cities,
                    CityCatalog::BUILTIN.join(", ")
                ),
            )
        })?;
        if s.include.is_empty() {
            return Ok(full);
        }
        if let Some(missing) = s.include.iter().find(|c| !full.contains(c)) {
            return Err(ConfigError::new(
                "simulation.include",
                format!("city \"{missing}\" is not in set \"{}\"", s.cities),
            ));
        }
        Ok(full.subset(&s.include))
    }

    /// Simulation parameters, anchoring a missing start to the `num_hours`
    /// ending at the hour containing `now`.
    pub fn simulation_params(&self, now: NaiveDateTime) -> SimulationParams {
        let s = &self.simulation;
        let start = s
            .start
            .unwrap_or_else(|| HourClock::trailing(now, s.hours).start());
        SimulationParams {
            start,
            num_hours: s.hours,
            profile: DiurnalProfile::new(
                s.base_kwh,
                s.daily_amplitude,
                s.semidiurnal_amplitude,
                s.peak_phase_hours,
            ),
            city_offset_stddev: s.city_offset_stddev,
            noise_stddev: s.noise_stddev,
            seed: s.seed,
        }
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if s.hours == 0 {
            errors.push(ConfigError::new("simulation.hours", "must be > 0"));
        } else if s.hours > MAX_SIMULATION_HOURS {
            errors.push(ConfigError::new(
                "simulation.hours",
                format!("must be <= {MAX_SIMULATION_HOURS}"),
            ));
        }
        for (field, value) in [
            ("simulation.base_kwh", s.base_kwh),
            ("simulation.daily_amplitude", s.daily_amplitude),
            ("simulation.semidiurnal_amplitude", s.semidiurnal_amplitude),
            ("simulation.peak_phase_hours", s.peak_phase_hours),
        ] {
            if !value.is_finite() {
                errors.push(ConfigError::new(field, "must be finite"));
            }
        }
        for (field, value) in [
            ("simulation.city_offset_stddev", s.city_offset_stddev),
            ("simulation.noise_stddev", s.noise_stddev),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                errors.push(ConfigError::new(field, "must be finite and >= 0"));
            }
        }
        if let Err(e) = self.catalog() {
            errors.push(e);
        }

        let a = &self.anomaly;
        if !(a.threshold.is_finite() && a.threshold > 0.0) {
            errors.push(ConfigError::new("anomaly.threshold", "must be finite and > 0"));
        }

        let f = &self.forecast;
        if f.model != "additive" && f.model != "naive" {
            errors.push(ConfigError::new(
                "forecast.model",
                format!("must be \"additive\" or \"naive\", got \"{}\"", f.model),
            ));
        }
        if f.horizon_hours == 0 {
            errors.push(ConfigError::new("forecast.horizon_hours", "must be > 0"));
        }
        if !(f.interval_z.is_finite() && f.interval_z >= 0.0) {
            errors.push(ConfigError::new(
                "forecast.interval_z",
                "must be finite and >= 0",
            ));
        }

        if self.data.path.as_os_str().is_empty() {
            errors.push(ConfigError::new("data.path", "must not be empty"));
        }

        let d = &self.dashboard;
        if d.bind.parse::<std::net::IpAddr>().is_err() {
            errors.push(ConfigError::new(
                "dashboard.bind",
                format!("\"{}\" is not an IP address", d.bind),
            ));
        }
        if let Ok(catalog) = self.catalog() {
            for city in &d.default_cities {
                if !catalog.contains(city) {
                    errors.push(ConfigError::new(
                        "dashboard.default_cities",
                        format!("city \"{city}\" is not simulated"),
                    ));
                }
            }
        }

        errors
    }
}
