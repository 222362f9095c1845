//! Color constants and auto-scaling helpers for the TUI.

use ratatui::style::Color;

/// Actual consumption line color.
pub const CONSUMPTION_COLOR: Color = Color::Cyan;
/// Anomaly marker color.
pub const ANOMALY_COLOR: Color = Color::Red;
/// Forecast line color.
pub const FORECAST_COLOR: Color = Color::Green;
/// Forecast bound color.
pub const BOUND_COLOR: Color = Color::DarkGray;
/// Map marker color.
pub const MARKER_COLOR: Color = Color::Yellow;
/// Header bar foreground.
pub const HEADER_FG: Color = Color::White;
/// Header bar background.
pub const HEADER_BG: Color = Color::DarkGray;
/// Footer help text color.
pub const FOOTER_FG: Color = Color::DarkGray;
/// Notice and error text color.
pub const NOTICE_FG: Color = Color::Magenta;
/// Highlighted city row.
pub const CURSOR_BG: Color = Color::Blue;

/// Computes Y-axis bounds over several point series with 10% padding.
pub fn auto_bounds_y(series: &[&[(f64, f64)]]) -> [f64; 2] {
    let all = series.iter().flat_map(|s| s.iter()).map(|&(_, y)| y);
    let min = all.clone().fold(f64::INFINITY, f64::min);
    let max = all.fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    let range = (max - min).max(0.1);
    let pad = range * 0.1;
    [min - pad, max + pad]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_cover_all_series() {
        let a = [(0.0, 10.0), (1.0, 20.0)];
        let b = [(2.0, 5.0)];
        let [lo, hi] = auto_bounds_y(&[&a, &b]);
        assert!(lo < 5.0 && hi > 20.0);
    }

    #[test]
    fn empty_series_get_unit_bounds() {
        assert_eq!(auto_bounds_y(&[]), [0.0, 1.0]);
    }
}
