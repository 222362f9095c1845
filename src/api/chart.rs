//! SVG charts for the web dashboard, drawn with `plotters`.
//!
//! Charts are strings embedded into the page, so the dashboard works
//! without any client-side script.

use std::error::Error;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use plotters::prelude::*;

use crate::dashboard::{CityPanel, ForecastPanel, MapMarker};

pub const CHART_WIDTH: u32 = 720;
pub const CHART_HEIGHT: u32 = 260;
pub const MAP_WIDTH: u32 = 720;
pub const MAP_HEIGHT: u32 = 320;

const MAP_PADDING_DEG: f64 = 1.0;

const ACTUAL: RGBColor = RGBColor(31, 119, 180);
const FORECAST: RGBColor = RGBColor(44, 160, 44);
const ANOMALY: RGBColor = RGBColor(214, 39, 40);
const MARKER: RGBColor = RGBColor(255, 127, 14);
const LABEL: RGBColor = RGBColor(85, 85, 85);

/// Consumption line with anomaly markers and, when present, the forecast
/// line over its shaded uncertainty band.
///
/// Returns an empty string when there is nothing to draw.
///
/// # Errors
///
/// Returns the drawing error from the SVG backend.
pub fn consumption_chart(panel: &CityPanel) -> Result<String, Box<dyn Error>> {
    let forecast = match &panel.forecast {
        ForecastPanel::Available { points, .. } => points.as_slice(),
        _ => &[],
    };
    let mut svg = String::new();

    let times = panel
        .points
        .iter()
        .map(|p| p.timestamp)
        .chain(forecast.iter().map(|p| p.timestamp));
    let Some((first, last)) = time_span(times) else {
        return Ok(svg);
    };
    let values = panel
        .points
        .iter()
        .map(|p| p.consumption)
        .chain(forecast.iter().flat_map(|p| [p.lower_bound, p.upper_bound]));
    let (y_min, y_max) = padded(min_max(values), 0.05);

    {
        let root =
            SVGBackend::with_string(&mut svg, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&panel.city, ("sans-serif", 14, &LABEL))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(first..last, y_min..y_max)?;

        chart
            .configure_mesh()
            .x_labels(6)
            .y_labels(5)
            .y_desc("kWh")
            .x_label_formatter(&|dt| dt.format("%m-%d %H:%M").to_string())
            .label_style(("sans-serif", 10, &LABEL))
            .draw()?;

        if !forecast.is_empty() {
            let band: Vec<(DateTime<Utc>, f64)> = forecast
                .iter()
                .map(|p| (p.timestamp.and_utc(), p.upper_bound))
                .chain(
                    forecast
                        .iter()
                        .rev()
                        .map(|p| (p.timestamp.and_utc(), p.lower_bound)),
                )
                .collect();
            chart.draw_series(std::iter::once(Polygon::new(
                band,
                FORECAST.mix(0.2).filled(),
            )))?;
            chart.draw_series(LineSeries::new(
                forecast
                    .iter()
                    .map(|p| (p.timestamp.and_utc(), p.predicted_consumption)),
                FORECAST.stroke_width(2),
            ))?;
        }

        chart.draw_series(LineSeries::new(
            panel
                .points
                .iter()
                .map(|p| (p.timestamp.and_utc(), p.consumption)),
            &ACTUAL,
        ))?;

        chart.draw_series(panel.anomalies().map(|p| {
            Circle::new((p.timestamp.and_utc(), p.consumption), 4, ANOMALY.filled())
        }))?;

        root.present()?;
    }

    Ok(svg)
}

/// City markers placed by longitude and latitude, sized by average use.
///
/// # Errors
///
/// Returns the drawing error from the SVG backend.
pub fn map(markers: &[MapMarker]) -> Result<String, Box<dyn Error>> {
    let mut svg = String::new();
    if markers.is_empty() {
        return Ok(svg);
    }
    let lon = min_max(markers.iter().map(|m| m.coordinates.longitude));
    let lat = min_max(markers.iter().map(|m| m.coordinates.latitude));
    let (lon_min, lon_max) = padded(lon, 0.0);
    let (lat_min, lat_max) = padded(lat, 0.0);

    {
        let root = SVGBackend::with_string(&mut svg, (MAP_WIDTH, MAP_HEIGHT)).into_drawing_area();
        root.fill(&RGBColor(238, 243, 247))?;

        let mut chart = ChartBuilder::on(&root).margin(10).build_cartesian_2d(
            lon_min - MAP_PADDING_DEG..lon_max + MAP_PADDING_DEG,
            lat_min - MAP_PADDING_DEG..lat_max + MAP_PADDING_DEG,
        )?;

        chart.draw_series(markers.iter().map(|m| {
            let radius = m.radius.round() as i32;
            EmptyElement::at((m.coordinates.longitude, m.coordinates.latitude))
                + Circle::new((0, 0), radius, MARKER.mix(0.6).filled())
                + Text::new(
                    format!("{} {:.0}", m.city, m.average_kwh),
                    (radius + 2, -5),
                    ("sans-serif", 10).into_font().color(&LABEL),
                )
        }))?;

        root.present()?;
    }

    Ok(svg)
}

fn time_span(
    times: impl Iterator<Item = NaiveDateTime>,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let (first, last) = times.fold(None, |acc: Option<(NaiveDateTime, NaiveDateTime)>, t| {
        Some(match acc {
            None => (t, t),
            Some((lo, hi)) => (lo.min(t), hi.max(t)),
        })
    })?;
    // A single point still needs a non-empty x range.
    let last = if last > first {
        last
    } else {
        first + Duration::hours(1)
    };
    Some((first.and_utc(), last.and_utc()))
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
        .unwrap_or((0.0, 1.0))
}

/// Widens `(lo, hi)` by `fraction` of its span, or by one unit when flat.
fn padded((lo, hi): (f64, f64), fraction: f64) -> (f64, f64) {
    let span = hi - lo;
    if span > f64::EPSILON {
        (lo - span * fraction, hi + span * fraction)
    } else {
        (lo - 1.0, hi + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Coordinates;
    use crate::dashboard::ChartPoint;
    use crate::series::ForecastPoint;
    use chrono::NaiveDate;

    fn t(h: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
            + Duration::hours(h)
    }

    fn panel(forecast: ForecastPanel) -> CityPanel {
        CityPanel {
            city: "Ankara".into(),
            points: (0..5)
                .map(|h| ChartPoint {
                    timestamp: t(h),
                    consumption: 10.0 + h as f64,
                    z_score: 0.0,
                    is_anomaly: h == 3,
                })
                .collect(),
            anomaly_count: 1,
            forecast,
        }
    }

    fn forecast_points() -> Vec<ForecastPoint> {
        (5..8)
            .map(|h| ForecastPoint {
                timestamp: t(h),
                predicted_consumption: 15.0,
                lower_bound: 12.0,
                upper_bound: 18.0,
            })
            .collect()
    }

    #[test]
    fn chart_marks_anomalies() {
        let svg = consumption_chart(&panel(ForecastPanel::Hidden)).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Ankara"));
        assert_eq!(svg.matches("<circle").count(), 1);
        assert!(!svg.contains("<polygon"));
    }

    #[test]
    fn chart_draws_forecast_band() {
        let svg = consumption_chart(&panel(ForecastPanel::Available {
            model: "naive",
            points: forecast_points(),
            suggestions: [String::new(), String::new()],
        }))
        .unwrap();
        assert!(svg.contains("<polygon"));
        assert!(svg.matches("<polyline").count() >= 2);
    }

    #[test]
    fn empty_panel_draws_nothing() {
        let mut empty = panel(ForecastPanel::Hidden);
        empty.points.clear();
        assert!(consumption_chart(&empty).unwrap().is_empty());
    }

    #[test]
    fn flat_single_point_still_draws() {
        let mut single = panel(ForecastPanel::Hidden);
        single.points.truncate(1);
        assert!(consumption_chart(&single).unwrap().contains("<svg"));
        assert_eq!(padded((5.0, 5.0), 0.05), (4.0, 6.0));
    }

    #[test]
    fn map_has_one_circle_per_marker() {
        let markers = vec![
            MapMarker {
                city: "Ankara".into(),
                coordinates: Coordinates {
                    latitude: 39.9,
                    longitude: 32.9,
                },
                average_kwh: 100.0,
                radius: 20.0,
            },
            MapMarker {
                city: "Izmir".into(),
                coordinates: Coordinates {
                    latitude: 38.4,
                    longitude: 27.1,
                },
                average_kwh: 50.0,
                radius: 12.5,
            },
        ];
        let svg = map(&markers).unwrap();
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.contains("Izmir"));
        assert!(map(&[]).unwrap().is_empty());
    }
}
