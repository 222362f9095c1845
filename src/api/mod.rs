//! Web dashboard and JSON API.
//!
//! - `GET /` server-rendered dashboard page
//! - `GET /api/state`, `/api/readings`, `/api/forecast`, `/api/forecast.csv`, `/api/map`
//! - `POST /regenerate` (form) and `POST /api/regenerate` (JSON)
//! - `GET /health`

mod chart;
mod handlers;
mod page;
pub mod types;

use std::net::SocketAddr;
use std::sync::{Arc, RwLock};

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use crate::dashboard::Session;

/// Application state shared across all request handlers.
///
/// Reads take the lock shared; regeneration takes it exclusively so a
/// render never sees a half-replaced data set.
pub struct AppState {
    pub session: RwLock<Session>,
}

impl AppState {
    pub fn new(session: Session) -> Arc<Self> {
        Arc::new(Self {
            session: RwLock::new(session),
        })
    }
}

/// Builds the axum router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::get_page))
        .route("/health", get(handlers::get_health))
        .route("/regenerate", post(handlers::post_regenerate_form))
        .route("/api/state", get(handlers::get_state))
        .route("/api/readings", get(handlers::get_readings))
        .route("/api/forecast", get(handlers::get_forecast))
        .route("/api/forecast.csv", get(handlers::get_forecast_csv))
        .route("/api/map", get(handlers::get_map))
        .route("/api/regenerate", post(handlers::post_regenerate))
        .with_state(state)
}

/// Binds to `addr` and serves until the server stops.
///
/// # Errors
///
/// Returns the I/O error if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "dashboard listening on http://{addr}");
    axum::serve(listener, app).await
}
