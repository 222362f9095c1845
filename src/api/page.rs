//! Server-rendered HTML dashboard page.

use askama::Template;
use axum::response::Html;
use tracing::{error, warn};

use super::chart;
use super::types::DATE_FORMAT;
use crate::dashboard::{DashboardState, DashboardView, DataStatus, ForecastPanel};

/// City checkbox in the filter form.
#[derive(Debug)]
pub struct CityOption {
    pub name: String,
    pub selected: bool,
}

/// One anomaly table row, pre-formatted.
#[derive(Debug)]
pub struct AnomalyRow {
    pub timestamp: String,
    pub consumption: String,
    pub z_score: String,
}

/// One city section of the page.
#[derive(Debug)]
pub struct PanelSection {
    pub city: String,
    pub chart_svg: String,
    pub reading_count: usize,
    pub anomalies: Vec<AnomalyRow>,
    pub forecast_model: String,
    pub suggestions: Vec<String>,
    /// Why no forecast is shown, empty when it is shown or switched off.
    pub forecast_reason: String,
    /// CSV download link, empty without a forecast.
    pub download_href: String,
}

/// Bare page shown when the dashboard template fails to render.
#[derive(Debug, Template)]
#[template(source = "<h1>Error rendering dashboard: {{ message }}</h1>", ext = "html")]
struct ErrorPage {
    message: String,
}

#[derive(Debug, Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub status: String,
    pub notices: Vec<String>,
    pub data_ready: bool,
    pub seed: u64,
    pub cities: Vec<CityOption>,
    pub from: String,
    pub to: String,
    pub show_forecast: bool,
    pub horizon_hours: usize,
    pub panels: Vec<PanelSection>,
    pub map_svg: String,
}

impl DashboardPage {
    pub fn new(state: &DashboardState, view: &DashboardView, data: &DataStatus, seed: u64) -> Self {
        let cities = view
            .available_cities
            .iter()
            .map(|name| CityOption {
                name: name.clone(),
                selected: state.is_selected(name),
            })
            .collect();

        let panels = view
            .panels
            .iter()
            .map(|panel| {
                let anomalies = panel
                    .anomalies()
                    .map(|p| AnomalyRow {
                        timestamp: p.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                        consumption: format!("{:.2}", p.consumption),
                        z_score: format!("{:.2}", p.z_score),
                    })
                    .collect();
                let (forecast_model, suggestions, forecast_reason, download_href) =
                    match &panel.forecast {
                        ForecastPanel::Hidden => Default::default(),
                        ForecastPanel::Available {
                            model, suggestions, ..
                        } => (
                            (*model).to_string(),
                            suggestions.to_vec(),
                            String::new(),
                            download_href(state, &panel.city),
                        ),
                        ForecastPanel::Unavailable { reason } => {
                            (String::new(), Vec::new(), reason.clone(), String::new())
                        }
                    };
                PanelSection {
                    city: panel.city.clone(),
                    chart_svg: chart::consumption_chart(panel).unwrap_or_else(|e| {
                        warn!(city = %panel.city, error = %e, "consumption chart failed");
                        String::new()
                    }),
                    reading_count: panel.points.len(),
                    anomalies,
                    forecast_model,
                    suggestions,
                    forecast_reason,
                    download_href,
                }
            })
            .collect();

        let mut notices = view.notices.clone();
        if let DataStatus::Unavailable { reason } = data {
            notices.push(format!("Data file unavailable: {reason}"));
        }

        Self {
            status: view.status.clone(),
            notices,
            data_ready: matches!(data, DataStatus::Ready { .. }),
            seed,
            cities,
            from: format_date(state.from),
            to: format_date(state.to),
            show_forecast: state.show_forecast,
            horizon_hours: state.horizon_hours,
            panels,
            map_svg: chart::map(&view.map).unwrap_or_else(|e| {
                warn!(error = %e, "map chart failed");
                String::new()
            }),
        }
    }

    /// Renders to HTML, falling back to a bare error page.
    pub fn into_html(self) -> Html<String> {
        match self.render() {
            Ok(html) => Html(html),
            Err(e) => {
                error!(error = %e, "dashboard template render error");
                let page = ErrorPage {
                    message: e.to_string(),
                };
                Html(page.render().unwrap_or_default())
            }
        }
    }
}

fn format_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// `/api/forecast.csv` link carrying the current window and horizon.
fn download_href(state: &DashboardState, city: &str) -> String {
    let mut href = format!(
        "/api/forecast.csv?city={}&horizon={}",
        urlencoding::encode(city),
        state.horizon_hours
    );
    if let Some(from) = state.from {
        href.push_str(&format!("&from={}", from.format(DATE_FORMAT)));
    }
    if let Some(to) = state.to {
        href.push_str(&format!("&to={}", to.format(DATE_FORMAT)));
    }
    href
}
