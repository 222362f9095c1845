//! API request parsing and response types.

use axum::Json;
use axum::http::StatusCode;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::dashboard::{DashboardState, DashboardView, DataStatus, SessionError};
use crate::series::ForecastPoint;

/// Longest forecast a request may ask for (two weeks).
pub const MAX_HORIZON_HOURS: usize = 336;

/// Date layout of the `from` / `to` query parameters.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Error tuple every fallible handler returns.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Error response body for 4xx/5xx errors.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

impl From<SessionError> for ErrorResponse {
    fn from(e: SessionError) -> Self {
        Self {
            error: e.to_string(),
        }
    }
}

/// Maps a session failure to its HTTP status.
pub fn session_error(e: SessionError) -> ApiError {
    let status = match &e {
        SessionError::NoData => StatusCode::SERVICE_UNAVAILABLE,
        SessionError::UnknownCity(_) => StatusCode::NOT_FOUND,
        SessionError::Forecast(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SessionError::Config(_) | SessionError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse::from(e)))
}

/// Builds a [`DashboardState`] from raw query pairs.
///
/// `city` may repeat. An empty query returns `defaults` unchanged; otherwise
/// the forecast is shown only when a `forecast` key is present with a value
/// other than `0`, `false` or `off`, which matches how an unchecked HTML
/// checkbox is omitted from a form.
///
/// # Errors
///
/// Returns a message for an unparseable date or horizon, or an unknown key.
pub fn parse_selection(
    pairs: &[(String, String)],
    defaults: DashboardState,
) -> Result<DashboardState, String> {
    if pairs.is_empty() {
        return Ok(defaults);
    }

    let mut state = DashboardState {
        show_forecast: false,
        ..defaults
    };
    let mut cities = Vec::new();

    for (key, value) in pairs {
        let value = value.trim();
        match key.as_str() {
            "city" => {
                if !value.is_empty() && !cities.iter().any(|c| c == value) {
                    cities.push(value.to_string());
                }
            }
            "from" => state.from = parse_date("from", value)?,
            "to" => state.to = parse_date("to", value)?,
            "forecast" => state.show_forecast = !matches!(value, "0" | "false" | "off"),
            "horizon" => {
                let horizon: usize = value
                    .parse()
                    .map_err(|_| format!("`horizon` value \"{value}\" is not a number"))?;
                if horizon == 0 || horizon > MAX_HORIZON_HOURS {
                    return Err(format!(
                        "`horizon` must be between 1 and {MAX_HORIZON_HOURS}, got {horizon}"
                    ));
                }
                state.horizon_hours = horizon;
            }
            other => return Err(format!("unknown query parameter `{other}`")),
        }
    }

    if !cities.is_empty() {
        state.cities = cities;
    }
    Ok(state)
}

fn parse_date(key: &str, value: &str) -> Result<Option<NaiveDate>, String> {
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(Some)
        .map_err(|_| format!("`{key}` value \"{value}\" is not a YYYY-MM-DD date"))
}

/// `GET /api/state` body.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub data: DataStatus,
    pub seed: u64,
    pub selection: DashboardState,
    pub view: DashboardView,
}

/// One row of `GET /api/readings`.
#[derive(Debug, Serialize)]
pub struct ReadingRecord {
    pub city: String,
    pub timestamp: NaiveDateTime,
    pub consumption: f64,
    pub z_score: f64,
    pub is_anomaly: bool,
}

/// `GET /api/forecast` body.
#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub city: String,
    pub model: &'static str,
    pub points: Vec<ForecastPoint>,
    pub suggestions: [String; 2],
}

/// Regeneration request, from a form or a JSON body.
#[derive(Debug, Default, Deserialize)]
pub struct RegenerateRequest {
    /// Seed to simulate with; empty or absent reuses the current seed.
    #[serde(default)]
    pub seed: Option<String>,
}

impl RegenerateRequest {
    /// # Errors
    ///
    /// Returns a message if `seed` is present but not a `u64`.
    pub fn seed(&self) -> Result<Option<u64>, String> {
        match self.seed.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s
                .parse()
                .map(Some)
                .map_err(|_| format!("`seed` value \"{s}\" is not a valid u64")),
        }
    }
}

/// `POST /api/regenerate` body.
#[derive(Debug, Serialize)]
pub struct RegenerateResponse {
    pub data: DataStatus,
    pub seed: u64,
    pub rows: usize,
}
