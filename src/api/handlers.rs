//! Request handlers for the dashboard page and the JSON API.

use std::sync::{Arc, RwLockReadGuard, RwLockWriteGuard};

use axum::Json;
use axum::extract::{Form, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use tracing::{info, warn};

use super::AppState;
use super::page::DashboardPage;
use super::types::{
    ApiError, ForecastResponse, ReadingRecord, RegenerateRequest, RegenerateResponse,
    StateResponse, api_error, parse_selection, session_error,
};
use crate::dashboard::{DashboardState, MapMarker, Session, SessionError, view};
use crate::forecast::Forecaster;
use crate::recommend;

type Pairs = Vec<(String, String)>;

fn read(state: &AppState) -> Result<RwLockReadGuard<'_, Session>, ApiError> {
    state
        .session
        .read()
        .map_err(|_| api_error(StatusCode::INTERNAL_SERVER_ERROR, "session lock poisoned"))
}

fn write(state: &AppState) -> Result<RwLockWriteGuard<'_, Session>, ApiError> {
    state
        .session
        .write()
        .map_err(|_| api_error(StatusCode::INTERNAL_SERVER_ERROR, "session lock poisoned"))
}

fn selection(session: &Session, pairs: &[(String, String)]) -> Result<DashboardState, ApiError> {
    parse_selection(pairs, session.default_state())
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))
}

fn page(session: &Session, state: &DashboardState, extra_notice: Option<String>) -> Html<String> {
    let view = session.render(state);
    let mut page = DashboardPage::new(state, &view, session.status(), session.seed());
    page.notices.extend(extra_notice);
    page.into_html()
}

/// Renders the dashboard page for the filters in the query string.
///
/// `GET /?city=A&city=B&from=YYYY-MM-DD&to=YYYY-MM-DD&forecast=on&horizon=72`
///
/// An invalid query falls back to the default selection with a notice.
pub async fn get_page(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Pairs>,
) -> Result<Html<String>, ApiError> {
    let session = read(&state)?;
    let html = match parse_selection(&pairs, session.default_state()) {
        Ok(selection) => page(&session, &selection, None),
        Err(e) => page(&session, &session.default_state(), Some(e)),
    };
    Ok(html)
}

/// Liveness probe.
///
/// `GET /health` → 200 `{"status":"ok"}`
pub async fn get_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Returns the rendered dashboard view as JSON.
///
/// `GET /api/state` → 200 + `StateResponse`
pub async fn get_state(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Pairs>,
) -> Result<Json<StateResponse>, ApiError> {
    let session = read(&state)?;
    let selection = selection(&session, &pairs)?;
    Ok(Json(StateResponse {
        data: session.status().clone(),
        seed: session.seed(),
        view: session.render(&selection),
        selection,
    }))
}

/// Returns annotated readings for the selected cities and dates.
///
/// Without a `city` key every loaded city is returned.
///
/// `GET /api/readings?city=A&from=...&to=...` → 200 + `Vec<ReadingRecord>`
/// `from` after `to` → 400, no data loaded → 503
pub async fn get_readings(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Pairs>,
) -> Result<Json<Vec<ReadingRecord>>, ApiError> {
    let session = read(&state)?;
    let mut selection = selection(&session, &pairs)?;
    if selection.is_inverted() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            crate::dashboard::state::INVERTED_RANGE,
        ));
    }
    let span = session
        .dataset()
        .time_span()
        .ok_or_else(|| session_error(SessionError::NoData))?;
    if !pairs.iter().any(|(k, _)| k == "city") {
        selection.cities = session.dataset().cities().map(str::to_string).collect();
    }
    if let Some(unknown) = selection
        .cities
        .iter()
        .find(|c| session.dataset().get(c).is_none())
    {
        return Err(session_error(SessionError::UnknownCity(unknown.clone())));
    }

    let (from, to) = selection.window(span);
    let records = session
        .annotated()
        .iter()
        .filter(|a| selection.is_selected(a.city()))
        .flat_map(|a| {
            let windowed = a.window(from, to);
            windowed
                .series
                .readings()
                .zip(windowed.z_scores.iter().zip(&windowed.is_anomaly))
                .map(|(r, (&z_score, &is_anomaly))| ReadingRecord {
                    city: r.city,
                    timestamp: r.timestamp,
                    consumption: r.consumption,
                    z_score,
                    is_anomaly,
                })
                .collect::<Vec<_>>()
        })
        .collect();
    Ok(Json(records))
}

/// Picks the one city a forecast request is about.
fn forecast_city(
    pairs: &[(String, String)],
    selection: &DashboardState,
) -> Result<String, ApiError> {
    let mut named = pairs.iter().filter(|(k, _)| k == "city").map(|(_, v)| v.trim());
    match (named.next(), named.next()) {
        (Some(city), None) => Ok(city.to_string()),
        (None, _) => selection
            .cities
            .first()
            .cloned()
            .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "missing `city` parameter")),
        (Some(_), Some(_)) => Err(api_error(
            StatusCode::BAD_REQUEST,
            "forecast takes exactly one `city`",
        )),
    }
}

/// Forecast and suggestions for one city over the selected window.
///
/// `GET /api/forecast?city=A&horizon=72` → 200 + `ForecastResponse`
/// unknown city → 404, too little history → 422, no data → 503
pub async fn get_forecast(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Pairs>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let session = read(&state)?;
    let selection = selection(&session, &pairs)?;
    let city = forecast_city(&pairs, &selection)?;
    let points = session.forecast(&selection, &city).map_err(session_error)?;
    let suggestions = recommend::suggestions(&points)
        .map_err(|e| api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
    Ok(Json(ForecastResponse {
        model: session.forecaster().name(),
        city,
        points,
        suggestions,
    }))
}

/// Forecast as a CSV attachment named `<city>_forecast.csv`.
///
/// `GET /api/forecast.csv?city=A` → 200 `text/csv`
pub async fn get_forecast_csv(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Pairs>,
) -> Result<Response, ApiError> {
    let session = read(&state)?;
    let selection = selection(&session, &pairs)?;
    let city = forecast_city(&pairs, &selection)?;
    let (file_name, body) = session
        .forecast_csv(&selection, &city)
        .map_err(session_error)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
        .into_response())
}

/// Average consumption markers over the last week of data.
///
/// `GET /api/map` → 200 + `Vec<MapMarker>`
pub async fn get_map(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MapMarker>>, ApiError> {
    let session = read(&state)?;
    Ok(Json(view::map_markers(session.annotated(), session.catalog())))
}

/// Regenerates from the dashboard form, then redirects back to the page.
///
/// `POST /regenerate` (form `seed=N`) → 303 to `/`
/// failure → 500 with the page and an error notice
pub async fn post_regenerate_form(
    State(state): State<Arc<AppState>>,
    Form(request): Form<RegenerateRequest>,
) -> Result<Response, ApiError> {
    let seed = request
        .seed()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    let mut session = write(&state)?;
    let result = session.regenerate(seed).map(|_| ());
    match result {
        Ok(()) => {
            info!(seed = session.seed(), "data regenerated from dashboard");
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            warn!(error = %e, "regeneration failed");
            let selection = session.default_state();
            let html = page(&session, &selection, Some(format!("Regeneration failed: {e}")));
            Ok((StatusCode::INTERNAL_SERVER_ERROR, html).into_response())
        }
    }
}

/// Regenerates and reports the new data status.
///
/// `POST /api/regenerate?seed=N` → 200 + `RegenerateResponse`
pub async fn post_regenerate(
    State(state): State<Arc<AppState>>,
    Query(request): Query<RegenerateRequest>,
) -> Result<Json<RegenerateResponse>, ApiError> {
    let seed = request
        .seed()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    let mut session = write(&state)?;
    let data = session.regenerate(seed).map_err(session_error)?.clone();
    Ok(Json(RegenerateResponse {
        data,
        seed: session.seed(),
        rows: session.dataset().row_count(),
    }))
}
