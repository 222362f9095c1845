//! TUI layout and widget rendering.

use chrono::NaiveDateTime;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Circle, Map, MapResolution};
use ratatui::widgets::{
    Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, Paragraph, Wrap,
};

use super::runtime::App;
use super::style;
use crate::dashboard::{CityPanel, DataStatus, ForecastPanel};

/// Map viewport padding around the outermost markers, in degrees.
const MAP_PADDING_DEG: f64 = 1.5;

/// Renders the full TUI frame.
pub fn render(frame: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Min(12),   // body
            Constraint::Length(1), // footer
        ])
        .split(frame.area());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(40)])
        .split(rows[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(14)])
        .split(body[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(7)])
        .split(body[1]);

    render_header(frame, app, rows[0]);
    render_cities(frame, app, left[0]);
    render_map(frame, app, left[1]);
    render_chart(frame, app, right[0]);
    render_details(frame, app, right[1]);
    render_footer(frame, rows[2]);
}

/// Header bar: filters and data status.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let dates = format!(
        "{} → {}",
        app.state
            .from
            .map_or_else(|| "start".to_string(), |d| d.to_string()),
        app.state.to.map_or_else(|| "end".to_string(), |d| d.to_string()),
    );
    let data = match app.session().status() {
        DataStatus::Ready { stale: false } => "READY",
        DataStatus::Ready { stale: true } => "STALE",
        DataStatus::Unavailable { .. } => "NO DATA",
    };
    let forecast = if app.state.show_forecast {
        format!("forecast {}h", app.state.horizon_hours)
    } else {
        "forecast off".to_string()
    };

    let header = Line::from(vec![
        Span::styled(
            " METER ANALYTICS ",
            Style::default()
                .fg(style::HEADER_FG)
                .bg(style::HEADER_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " {dates} │ {forecast} │ seed {} │ {data} ",
            app.session().seed()
        )),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

/// City checklist with the cursor row highlighted.
fn render_cities(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .view
        .available_cities
        .iter()
        .enumerate()
        .map(|(i, city)| {
            let mark = if app.state.is_selected(city) { "[x]" } else { "[ ]" };
            let style = if i == app.cursor {
                Style::default().bg(style::CURSOR_BG)
            } else {
                Style::default()
            };
            ListItem::new(format!("{mark} {city}")).style(style)
        })
        .collect();

    let list = List::new(items).block(Block::default().title(" Cities ").borders(Borders::ALL));
    frame.render_widget(list, area);
}

/// World outline with one circle per city, sized by weekly average.
fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let markers = &app.view.map;
    let lon = bounds(markers.iter().map(|m| m.coordinates.longitude), (25.0, 45.0));
    let lat = bounds(markers.iter().map(|m| m.coordinates.latitude), (35.0, 43.0));
    let max_radius = markers.iter().map(|m| m.radius).fold(1.0, f64::max);
    // Largest marker spans a tenth of the visible longitude range.
    let scale = (lon[1] - lon[0]) / 10.0 / max_radius;

    let canvas = Canvas::default()
        .block(Block::default().title(" Last 7 days ").borders(Borders::ALL))
        .x_bounds(lon)
        .y_bounds(lat)
        .paint(move |ctx| {
            ctx.draw(&Map {
                resolution: MapResolution::High,
                color: style::BOUND_COLOR,
            });
            ctx.layer();
            for m in markers {
                ctx.draw(&Circle {
                    x: m.coordinates.longitude,
                    y: m.coordinates.latitude,
                    radius: m.radius * scale,
                    color: style::MARKER_COLOR,
                });
            }
        });
    frame.render_widget(canvas, area);
}

fn bounds(values: impl Iterator<Item = f64>, fallback: (f64, f64)) -> [f64; 2] {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if lo.is_finite() && hi.is_finite() {
        [lo - MAP_PADDING_DEG, hi + MAP_PADDING_DEG]
    } else {
        [fallback.0, fallback.1]
    }
}

fn hours_since(origin: NaiveDateTime, t: NaiveDateTime) -> f64 {
    (t - origin).num_minutes() as f64 / 60.0
}

/// Consumption, anomalies and forecast band for the focused city.
fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let Some(panel) = app.focused_panel() else {
        let text = Paragraph::new(app.view.status.as_str())
            .block(Block::default().title(" Consumption ").borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        frame.render_widget(text, area);
        return;
    };

    let Some(origin) = chart_origin(panel) else {
        let text = Paragraph::new("No readings in the selected window.")
            .block(Block::default().title(format!(" {} ", panel.city)).borders(Borders::ALL));
        frame.render_widget(text, area);
        return;
    };

    let actual: Vec<(f64, f64)> = panel
        .points
        .iter()
        .map(|p| (hours_since(origin, p.timestamp), p.consumption))
        .collect();
    let anomalies: Vec<(f64, f64)> = panel
        .anomalies()
        .map(|p| (hours_since(origin, p.timestamp), p.consumption))
        .collect();
    type Points = Vec<(f64, f64)>;
    let (predicted, lower, upper): (Points, Points, Points) = match &panel.forecast {
        ForecastPanel::Available { points, .. } => (
            points
                .iter()
                .map(|p| (hours_since(origin, p.timestamp), p.predicted_consumption))
                .collect(),
            points
                .iter()
                .map(|p| (hours_since(origin, p.timestamp), p.lower_bound))
                .collect(),
            points
                .iter()
                .map(|p| (hours_since(origin, p.timestamp), p.upper_bound))
                .collect(),
        ),
        _ => (Vec::new(), Vec::new(), Vec::new()),
    };

    let y_bounds = style::auto_bounds_y(&[actual.as_slice(), lower.as_slice(), upper.as_slice()]);
    let x_hi = predicted
        .last()
        .or(actual.last())
        .map_or(1.0, |p| p.0)
        .max(1.0);

    let mut datasets = vec![
        Dataset::default()
            .name("Actual")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(style::CONSUMPTION_COLOR))
            .data(&actual),
        Dataset::default()
            .name("Anomaly")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(style::ANOMALY_COLOR))
            .data(&anomalies),
    ];
    if !predicted.is_empty() {
        datasets.push(
            Dataset::default()
                .name("Forecast")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(style::FORECAST_COLOR))
                .data(&predicted),
        );
        datasets.push(
            Dataset::default()
                .marker(symbols::Marker::Dot)
                .style(Style::default().fg(style::BOUND_COLOR))
                .data(&lower),
        );
        datasets.push(
            Dataset::default()
                .marker(symbols::Marker::Dot)
                .style(Style::default().fg(style::BOUND_COLOR))
                .data(&upper),
        );
    }

    let end = origin + chrono::Duration::minutes((x_hi * 60.0) as i64);
    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(format!(" {} ({}/{}) ", panel.city, app.focus + 1, app.view.panels.len()))
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title("time")
                .bounds([0.0, x_hi])
                .labels(vec![
                    origin.format("%m-%d %H:%M").to_string(),
                    end.format("%m-%d %H:%M").to_string(),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("kWh")
                .bounds(y_bounds)
                .labels(vec![
                    format!("{:.1}", y_bounds[0]),
                    format!("{:.1}", y_bounds[1]),
                ]),
        );

    frame.render_widget(chart, area);
}

fn chart_origin(panel: &CityPanel) -> Option<NaiveDateTime> {
    panel.points.first().map(|p| p.timestamp).or_else(|| match &panel.forecast {
        ForecastPanel::Available { points, .. } => points.first().map(|p| p.timestamp),
        _ => None,
    })
}

/// Anomaly count, forecast suggestions, notices and the last action result.
fn render_details(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![Line::from(format!("  {}", app.view.status))];
    if let Some(panel) = app.focused_panel() {
        lines.push(Line::from(format!(
            "  {}: {} anomalies (|z| > threshold)",
            panel.city, panel.anomaly_count
        )));
        match &panel.forecast {
            ForecastPanel::Available { suggestions, .. } => {
                lines.extend(suggestions.iter().map(|s| Line::from(format!("  • {s}"))));
            }
            ForecastPanel::Unavailable { reason } => lines.push(Line::from(Span::styled(
                format!("  Forecast unavailable: {reason}"),
                Style::default().fg(style::NOTICE_FG),
            ))),
            ForecastPanel::Hidden => {}
        }
    }
    let notices = app.view.notices.iter().chain(app.message.as_ref());
    lines.extend(notices.map(|n| {
        Line::from(Span::styled(
            format!("  {n}"),
            Style::default().fg(style::NOTICE_FG),
        ))
    }));

    let block = Block::default().title(" Details ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Footer with keybinding hints.
fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(Span::styled(
        " q:Quit  ↑/↓ Space:City  Tab:Next  [ ]:From  { }:To  x:Clear  f:Forecast  +/-:Horizon  e:Export  r:Regenerate",
        Style::default().fg(style::FOOTER_FG),
    )));
    frame.render_widget(footer, area);
}
