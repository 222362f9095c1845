use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// Message shown when the date filter is inverted.
pub const INVERTED_RANGE: &str = "Start date cannot be after end date.";

/// Explicit filter selections driving one dashboard render.
///
/// Dates are inclusive whole days; `None` leaves that side of the window at
/// the edge of the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardState {
    pub cities: Vec<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub show_forecast: bool,
    pub horizon_hours: usize,
}

impl DashboardState {
    pub fn new(cities: Vec<String>, horizon_hours: usize) -> Self {
        Self {
            cities,
            from: None,
            to: None,
            show_forecast: true,
            horizon_hours,
        }
    }

    /// `true` when both dates are set and `from` is after `to`.
    pub fn is_inverted(&self) -> bool {
        matches!((self.from, self.to), (Some(from), Some(to)) if from > to)
    }

    /// Timestamp window `[first hour of from, last second of to]`.
    ///
    /// Unset sides fall back to `span`. An inverted range is returned as-is
    /// and selects nothing.
    pub fn window(&self, span: (NaiveDateTime, NaiveDateTime)) -> (NaiveDateTime, NaiveDateTime) {
        let from = self.from.map_or(span.0, |d| d.and_time(NaiveTime::MIN));
        let to = self.to.map_or(span.1, |d| {
            d.and_hms_opt(23, 59, 59).unwrap_or_else(|| d.and_time(NaiveTime::MIN))
        });
        (from, to)
    }

    pub fn is_selected(&self, city: &str) -> bool {
        self.cities.iter().any(|c| c == city)
    }

    /// Selects `city` if absent, deselects it otherwise.
    pub fn toggle_city(&mut self, city: &str) {
        if let Some(pos) = self.cities.iter().position(|c| c == city) {
            self.cities.remove(pos);
        } else {
            self.cities.push(city.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn span() -> (NaiveDateTime, NaiveDateTime) {
        (
            day(1).and_hms_opt(0, 0, 0).unwrap(),
            day(7).and_hms_opt(23, 0, 0).unwrap(),
        )
    }

    #[test]
    fn unset_dates_use_data_span() {
        let state = DashboardState::new(vec!["Ankara".into()], 72);
        assert_eq!(state.window(span()), span());
    }

    #[test]
    fn dates_are_inclusive_days() {
        let mut state = DashboardState::new(Vec::new(), 72);
        state.from = Some(day(3));
        state.to = Some(day(3));
        let (from, to) = state.window(span());
        assert_eq!(from, day(3).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(to, day(3).and_hms_opt(23, 59, 59).unwrap());
    }

    #[test]
    fn inverted_range_is_detected() {
        let mut state = DashboardState::new(Vec::new(), 72);
        state.from = Some(day(5));
        state.to = Some(day(2));
        assert!(state.is_inverted());
        let (from, to) = state.window(span());
        assert!(from > to);
    }

    #[test]
    fn toggle_city_adds_and_removes() {
        let mut state = DashboardState::new(vec!["Izmir".into()], 72);
        state.toggle_city("Bursa");
        assert!(state.is_selected("Bursa"));
        state.toggle_city("Izmir");
        assert_eq!(state.cities, vec!["Bursa".to_string()]);
    }
}
