use std::f64::consts::PI;

/// Deterministic daily consumption shape shared by every simulated city.
///
/// `DiurnalProfile` combines a daily harmonic and a half-day harmonic around
/// a baseline, shifted so that consumption is high around midday and in the
/// evening and lowest overnight.
///
/// # Examples
///
/// ```
/// use meter_analytics::sim::profile::DiurnalProfile;
///
/// let profile = DiurnalProfile::new(100.0, 20.0, 10.0, 9.0);
/// assert!(profile.value_at(12.0) > profile.value_at(3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiurnalProfile {
    /// Mean hourly consumption in kWh.
    pub base_kwh: f64,

    /// Amplitude of the 24-hour harmonic in kWh.
    pub daily_amplitude: f64,

    /// Amplitude of the 12-hour harmonic in kWh.
    pub semidiurnal_amplitude: f64,

    /// Hour of day at which both harmonics cross zero on the way up.
    pub peak_phase_hours: f64,
}

impl DiurnalProfile {
    /// Creates a profile.
    ///
    /// # Arguments
    ///
    /// * `base_kwh` - Mean hourly consumption
    /// * `daily_amplitude` - Amplitude of the 24-hour harmonic
    /// * `semidiurnal_amplitude` - Amplitude of the 12-hour harmonic
    /// * `peak_phase_hours` - Phase shift in hours
    pub fn new(
        base_kwh: f64,
        daily_amplitude: f64,
        semidiurnal_amplitude: f64,
        peak_phase_hours: f64,
    ) -> Self {
        Self {
            base_kwh,
            daily_amplitude,
            semidiurnal_amplitude,
            peak_phase_hours,
        }
    }

    /// Noise-free consumption at a (possibly fractional) hour of day.
    pub fn value_at(&self, hour_of_day: f64) -> f64 {
        let shifted = hour_of_day - self.peak_phase_hours;
        self.base_kwh
            + self.daily_amplitude * (2.0 * PI * shifted / 24.0).sin()
            + self.semidiurnal_amplitude * (4.0 * PI * shifted / 24.0).sin()
    }

    /// Envelope the noise-free shape can never leave:
    /// `base ± (|daily| + |semidiurnal|)`.
    pub fn bounds(&self) -> (f64, f64) {
        let swing = self.daily_amplitude.abs() + self.semidiurnal_amplitude.abs();
        (self.base_kwh - swing, self.base_kwh + swing)
    }
}

impl Default for DiurnalProfile {
    fn default() -> Self {
        Self::new(100.0, 20.0, 10.0, 9.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midday_exceeds_overnight() {
        let p = DiurnalProfile::default();
        let night = p.value_at(3.0);
        let midday = p.value_at(12.0);
        let evening = p.value_at(19.0);
        assert!(midday > night);
        assert!(evening > night);
    }

    #[test]
    fn shape_stays_within_bounds() {
        let p = DiurnalProfile::default();
        let (lo, hi) = p.bounds();
        for quarter in 0..96 {
            let v = p.value_at(f64::from(quarter) / 4.0);
            assert!(v >= lo && v <= hi, "{v} outside [{lo}, {hi}]");
        }
    }

    #[test]
    fn profile_repeats_every_day() {
        let p = DiurnalProfile::default();
        assert!((p.value_at(5.0) - p.value_at(29.0)).abs() < 1e-9);
    }

    #[test]
    fn flat_profile_is_constant() {
        let p = DiurnalProfile::new(50.0, 0.0, 0.0, 0.0);
        assert_eq!(p.value_at(0.0), 50.0);
        assert_eq!(p.value_at(13.0), 50.0);
        assert_eq!(p.bounds(), (50.0, 50.0));
    }
}
