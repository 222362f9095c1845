//! Pure rendering of dashboard state into a front-end neutral view.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use super::state::{DashboardState, INVERTED_RANGE};
use crate::anomaly::AnnotatedSeries;
use crate::catalog::{CityCatalog, Coordinates};
use crate::forecast::Forecaster;
use crate::recommend;
use crate::series::ForecastPoint;

/// Span the map averages over, counted back from the latest reading.
pub const MAP_WINDOW_DAYS: i64 = 7;

/// Smallest map marker radius.
pub const MIN_MARKER_RADIUS: f64 = 5.0;

/// Extra radius of the city with the highest average.
pub const MARKER_RADIUS_RANGE: f64 = 15.0;

/// Everything a front-end needs to draw one dashboard frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    /// Cities available for selection, in data order.
    pub available_cities: Vec<String>,
    /// Effective timestamp window, `None` without data.
    pub window: Option<(NaiveDateTime, NaiveDateTime)>,
    /// One panel per selected city that exists in the data.
    pub panels: Vec<CityPanel>,
    /// Average consumption per city over the last week of data.
    pub map: Vec<MapMarker>,
    /// One-line summary of what is shown.
    pub status: String,
    /// User-facing problems with the selection.
    pub notices: Vec<String>,
}

/// One point of a city chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub timestamp: NaiveDateTime,
    pub consumption: f64,
    pub z_score: f64,
    pub is_anomaly: bool,
}

/// Chart data for one selected city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityPanel {
    pub city: String,
    pub points: Vec<ChartPoint>,
    pub anomaly_count: usize,
    pub forecast: ForecastPanel,
}

impl CityPanel {
    pub fn anomalies(&self) -> impl Iterator<Item = &ChartPoint> {
        self.points.iter().filter(|p| p.is_anomaly)
    }
}

/// Forecast section of a city panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastPanel {
    /// Forecasting is switched off.
    Hidden,
    Available {
        model: &'static str,
        points: Vec<ForecastPoint>,
        suggestions: [String; 2],
    },
    Unavailable {
        reason: String,
    },
}

/// Map marker for one city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub city: String,
    pub coordinates: Coordinates,
    pub average_kwh: f64,
    pub radius: f64,
}

/// Builds the view for `state` from already annotated data.
///
/// Anomaly flags come from the full per-city series, so narrowing the date
/// window never changes which readings are flagged. Forecasts are fitted to
/// the windowed series only. The map ignores the city and date filters.
pub fn render(
    state: &DashboardState,
    data: &[AnnotatedSeries],
    catalog: &CityCatalog,
    forecaster: &dyn Forecaster,
) -> DashboardView {
    let available_cities: Vec<String> = data.iter().map(|a| a.city().to_string()).collect();
    let mut notices = Vec::new();

    let Some(span) = data_span(data) else {
        return DashboardView {
            available_cities,
            window: None,
            panels: Vec::new(),
            map: Vec::new(),
            status: "No data loaded.".to_string(),
            notices,
        };
    };

    if state.is_inverted() {
        notices.push(INVERTED_RANGE.to_string());
    }
    for city in &state.cities {
        if !available_cities.contains(city) {
            notices.push(format!("Unknown city \"{city}\" ignored."));
        }
    }

    let (from, to) = state.window(span);
    let panels: Vec<CityPanel> = state
        .cities
        .iter()
        .filter_map(|city| data.iter().find(|a| a.city() == city))
        .map(|annotated| city_panel(state, &annotated.window(from, to), forecaster))
        .collect();

    let shown: usize = panels.iter().map(|p| p.points.len()).sum();
    let flagged: usize = panels.iter().map(|p| p.anomaly_count).sum();
    let status = format!(
        "{} of {} cities | {} to {} | {} readings, {} anomalies",
        panels.len(),
        available_cities.len(),
        from.format("%Y-%m-%d %H:%M"),
        to.format("%Y-%m-%d %H:%M"),
        shown,
        flagged
    );

    DashboardView {
        available_cities,
        window: Some((from, to)),
        panels,
        map: map_markers(data, catalog),
        status,
        notices,
    }
}

fn city_panel(
    state: &DashboardState,
    windowed: &AnnotatedSeries,
    forecaster: &dyn Forecaster,
) -> CityPanel {
    let points = windowed
        .series
        .timestamps()
        .zip(windowed.series.values())
        .zip(windowed.z_scores.iter().zip(&windowed.is_anomaly))
        .map(|((timestamp, &consumption), (&z_score, &is_anomaly))| ChartPoint {
            timestamp,
            consumption,
            z_score,
            is_anomaly,
        })
        .collect();

    let forecast = if !state.show_forecast {
        ForecastPanel::Hidden
    } else {
        match forecaster.forecast(&windowed.series, state.horizon_hours) {
            Ok(points) => match recommend::suggestions(&points) {
                Ok(suggestions) => ForecastPanel::Available {
                    model: forecaster.name(),
                    points,
                    suggestions,
                },
                Err(e) => ForecastPanel::Unavailable {
                    reason: e.to_string(),
                },
            },
            Err(e) => ForecastPanel::Unavailable {
                reason: e.to_string(),
            },
        }
    };

    CityPanel {
        city: windowed.city().to_string(),
        points,
        anomaly_count: windowed.anomaly_count(),
        forecast,
    }
}

/// Per-city mean over the readings at most [`MAP_WINDOW_DAYS`] before the
/// latest reading of any city, joined with catalog coordinates.
///
/// Cities without coordinates are skipped. Radii scale linearly with the
/// average, relative to the largest one.
pub fn map_markers(data: &[AnnotatedSeries], catalog: &CityCatalog) -> Vec<MapMarker> {
    let Some((_, latest)) = data_span(data) else {
        return Vec::new();
    };
    let cutoff = latest - Duration::days(MAP_WINDOW_DAYS);

    let averages: Vec<(&str, Coordinates, f64)> = data
        .iter()
        .filter_map(|a| {
            let coordinates = catalog.coordinates(a.city())?;
            let average = a.series.window(cutoff, latest).mean()?;
            Some((a.city(), coordinates, average))
        })
        .collect();

    let max_avg = averages.iter().map(|(_, _, avg)| *avg).fold(0.0, f64::max);
    averages
        .into_iter()
        .map(|(city, coordinates, average_kwh)| MapMarker {
            city: city.to_string(),
            coordinates,
            average_kwh,
            radius: if max_avg > 0.0 {
                MIN_MARKER_RADIUS + MARKER_RADIUS_RANGE * average_kwh / max_avg
            } else {
                MIN_MARKER_RADIUS
            },
        })
        .collect()
}

fn data_span(data: &[AnnotatedSeries]) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let first = data
        .iter()
        .filter(|a| !a.series.is_empty())
        .map(|a| a.series.start())
        .min()?;
    let last = data.iter().filter_map(|a| a.series.end()).max()?;
    Some((first, last))
}
