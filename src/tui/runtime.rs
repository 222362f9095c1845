//! Terminal dashboard application state.

use std::path::PathBuf;

use chrono::{Duration, NaiveDate};

use crate::dashboard::{DashboardState, DashboardView, ForecastPanel, Session};
use crate::io::export::{export_forecast_csv, forecast_file_name};

/// Horizon change per keypress.
const HORIZON_STEP_HOURS: usize = 24;

/// Longest horizon the terminal view offers.
const MAX_HORIZON_HOURS: usize = 336;

/// TUI application state.
pub struct App {
    session: Session,
    /// Current filter selections.
    pub state: DashboardState,
    /// Render of `state`, refreshed after every change.
    pub view: DashboardView,
    /// Highlighted row in the city list.
    pub cursor: usize,
    /// Index into `view.panels` of the charted city.
    pub focus: usize,
    /// One-line feedback from the last action.
    pub message: Option<String>,
    /// Whether the user has requested quit.
    pub quit: bool,
}

impl App {
    pub fn new(session: Session) -> Self {
        let state = session.default_state();
        let view = session.render(&state);
        Self {
            session,
            state,
            view,
            cursor: 0,
            focus: 0,
            message: None,
            quit: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn refresh(&mut self) {
        self.view = self.session.render(&self.state);
        if self.focus >= self.view.panels.len() {
            self.focus = 0;
        }
        let cities = self.view.available_cities.len();
        if cities > 0 && self.cursor >= cities {
            self.cursor = cities - 1;
        }
    }

    pub fn cursor_down(&mut self) {
        if self.cursor + 1 < self.view.available_cities.len() {
            self.cursor += 1;
        }
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Selects or deselects the highlighted city.
    pub fn toggle_city(&mut self) {
        let Some(city) = self.view.available_cities.get(self.cursor).cloned() else {
            return;
        };
        self.state.toggle_city(&city);
        self.refresh();
    }

    /// Moves the chart to the next selected city.
    pub fn next_panel(&mut self) {
        if !self.view.panels.is_empty() {
            self.focus = (self.focus + 1) % self.view.panels.len();
        }
    }

    pub fn toggle_forecast(&mut self) {
        self.state.show_forecast = !self.state.show_forecast;
        self.refresh();
    }

    pub fn horizon_up(&mut self) {
        self.state.horizon_hours =
            (self.state.horizon_hours + HORIZON_STEP_HOURS).min(MAX_HORIZON_HOURS);
        self.refresh();
    }

    pub fn horizon_down(&mut self) {
        self.state.horizon_hours = self
            .state
            .horizon_hours
            .saturating_sub(HORIZON_STEP_HOURS)
            .max(HORIZON_STEP_HOURS);
        self.refresh();
    }

    /// Moves the start date by `days`, starting from the first day of data.
    pub fn shift_from(&mut self, days: i64) {
        let Some((first, _)) = self.session.dataset().time_span() else {
            return;
        };
        let from = self.state.from.unwrap_or(first.date());
        self.state.from = shift(from, days);
        self.refresh();
    }

    /// Moves the end date by `days`, starting from the last day of data.
    pub fn shift_to(&mut self, days: i64) {
        let Some((_, last)) = self.session.dataset().time_span() else {
            return;
        };
        let to = self.state.to.unwrap_or(last.date());
        self.state.to = shift(to, days);
        self.refresh();
    }

    /// Drops both date filters.
    pub fn clear_dates(&mut self) {
        self.state.from = None;
        self.state.to = None;
        self.refresh();
    }

    /// Re-simulates with the next seed and reloads.
    pub fn regenerate(&mut self) {
        let seed = self.session.seed().wrapping_add(1);
        self.message = Some(match self.session.regenerate(Some(seed)) {
            Ok(_) => format!("Regenerated data with seed {seed}."),
            Err(e) => format!("Regeneration failed: {e}"),
        });
        if self.state.cities.is_empty() {
            self.state = self.session.default_state();
        }
        self.refresh();
    }

    /// Writes the charted city's forecast next to the working directory.
    pub fn export_forecast(&mut self) {
        self.message = Some(match self.export_focused() {
            Ok(path) => format!("Forecast written to {}", path.display()),
            Err(e) => e,
        });
    }

    fn export_focused(&self) -> Result<PathBuf, String> {
        let panel = self
            .focused_panel()
            .ok_or_else(|| "No city selected.".to_string())?;
        let ForecastPanel::Available { points, .. } = &panel.forecast else {
            return Err(format!("No forecast available for {}.", panel.city));
        };
        let path = PathBuf::from(forecast_file_name(&panel.city));
        export_forecast_csv(&panel.city, points, &path).map_err(|e| e.to_string())?;
        Ok(path)
    }

    pub fn focused_panel(&self) -> Option<&crate::dashboard::CityPanel> {
        self.view.panels.get(self.focus)
    }
}

fn shift(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::days(days)).or(Some(date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyticsConfig;
    use chrono::NaiveDateTime;

    fn make_app(dir: &std::path::Path) -> App {
        let mut config = AnalyticsConfig::turkey10();
        config.simulation.include = vec!["Ankara".into(), "Izmir".into(), "Bursa".into()];
        config.dashboard.default_cities = vec!["Ankara".into()];
        config.data.path = dir.join("consumption.csv");
        let mut session = Session::open(config).unwrap();
        session.regenerate_at(None, NaiveDateTime::default()).unwrap();
        App::new(session)
    }

    #[test]
    fn starts_with_default_city() {
        let dir = tempfile::tempdir().unwrap();
        let app = make_app(dir.path());
        assert_eq!(app.view.panels.len(), 1);
        assert_eq!(app.focused_panel().unwrap().city, "Ankara");
    }

    #[test]
    fn toggling_cities_updates_panels() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = make_app(dir.path());
        app.cursor_down();
        app.toggle_city();
        assert_eq!(app.view.panels.len(), 2);
        app.next_panel();
        assert_eq!(app.focus, 1);
        app.toggle_city();
        assert_eq!(app.view.panels.len(), 1);
        assert_eq!(app.focus, 0);
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = make_app(dir.path());
        for _ in 0..10 {
            app.cursor_down();
        }
        assert_eq!(app.cursor, 2);
        for _ in 0..10 {
            app.cursor_up();
        }
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn inverted_dates_show_notice() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = make_app(dir.path());
        app.shift_from(5);
        app.shift_to(-5);
        assert!(app.state.is_inverted());
        assert!(!app.view.notices.is_empty());
        app.clear_dates();
        assert!(app.view.notices.is_empty());
    }

    #[test]
    fn horizon_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = make_app(dir.path());
        for _ in 0..20 {
            app.horizon_up();
        }
        assert_eq!(app.state.horizon_hours, MAX_HORIZON_HOURS);
        for _ in 0..20 {
            app.horizon_down();
        }
        assert_eq!(app.state.horizon_hours, HORIZON_STEP_HOURS);
    }

    #[test]
    fn regenerate_advances_seed() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = make_app(dir.path());
        let seed = app.session().seed();
        app.regenerate();
        assert_eq!(app.session().seed(), seed + 1);
        assert!(app.message.as_deref().unwrap().starts_with("Regenerated"));
    }

    #[test]
    fn export_without_forecast_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = make_app(dir.path());
        app.toggle_forecast();
        app.export_forecast();
        assert!(app.message.as_deref().unwrap().starts_with("No forecast"));
    }
}
