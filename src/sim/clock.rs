use chrono::{Duration, NaiveDateTime, Timelike};

/// An hourly simulation clock over a fixed window.
///
/// The clock yields `(index, timestamp)` pairs, one per hour, starting at the
/// window start.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use meter_analytics::sim::clock::HourClock;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let mut clock = HourClock::new(start, 3);
/// let mut hours = Vec::new();
///
/// clock.run(|i, _| hours.push(i));
/// assert_eq!(hours, vec![0, 1, 2]);
/// ```
pub struct HourClock {
    /// First hour of the window.
    start: NaiveDateTime,
    /// Index of the next hour to emit.
    current: usize,
    /// Total hours in the window.
    total: usize,
}

impl HourClock {
    /// Creates a clock covering `total` hours starting at `start`.
    pub fn new(start: NaiveDateTime, total: usize) -> Self {
        Self {
            start,
            current: 0,
            total,
        }
    }

    /// Creates a clock for the `total` hours ending at the hour containing
    /// `now`.
    ///
    /// A window reaching before the earliest representable time starts at
    /// [`NaiveDateTime::MIN`].
    pub fn trailing(now: NaiveDateTime, total: usize) -> Self {
        let end = floor_to_hour(now);
        let start = i64::try_from(total.saturating_sub(1))
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|back| end.checked_sub_signed(back))
            .unwrap_or(NaiveDateTime::MIN);
        Self::new(start, total)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Advances the clock by one hour.
    ///
    /// # Returns
    ///
    /// * `Some((index, timestamp))` - The hour before advancing
    /// * `None` - If the window is exhausted
    pub fn tick(&mut self) -> Option<(usize, NaiveDateTime)> {
        if self.current < self.total {
            let index = self.current;
            self.current += 1;
            Some((index, self.start + Duration::hours(index as i64)))
        } else {
            None
        }
    }

    /// Runs a function for each remaining hour of the window.
    pub fn run(&mut self, mut f: impl FnMut(usize, NaiveDateTime)) {
        while let Some((index, ts)) = self.tick() {
            f(index, ts);
        }
    }
}

/// Truncates minutes, seconds and sub-seconds.
pub fn floor_to_hour(ts: NaiveDateTime) -> NaiveDateTime {
    ts.date()
        .and_hms_opt(ts.hour(), 0, 0)
        .unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 10)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .unwrap()
    }

    #[test]
    fn test_tick() {
        let mut clock = HourClock::new(at(0, 0), 2);
        assert_eq!(clock.tick(), Some((0, at(0, 0))));
        assert_eq!(clock.tick(), Some((1, at(1, 0))));
        assert_eq!(clock.tick(), None);
    }

    #[test]
    fn test_empty_clock() {
        let mut clock = HourClock::new(at(0, 0), 0);
        assert_eq!(clock.tick(), None);

        let mut was_called = false;
        clock.run(|_, _| was_called = true);
        assert!(!was_called);
    }

    #[test]
    fn trailing_window_ends_at_current_hour() {
        let mut clock = HourClock::trailing(at(12, 47), 5);
        assert_eq!(clock.start(), at(8, 0));
        let mut last = None;
        clock.run(|_, ts| last = Some(ts));
        assert_eq!(last, Some(at(12, 0)));
    }

    #[test]
    fn trailing_window_saturates_instead_of_overflowing() {
        let clock = HourClock::trailing(at(12, 0), 5_000_000_000);
        assert_eq!(clock.start(), NaiveDateTime::MIN);
        assert_eq!(clock.total(), 5_000_000_000);
    }
}
