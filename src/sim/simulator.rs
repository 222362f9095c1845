//! Synthetic hourly consumption generator.

use chrono::{NaiveDateTime, Timelike};
use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info, warn};

use super::clock::HourClock;
use super::noise::gaussian_noise;
use super::profile::DiurnalProfile;
use crate::io::totals::AnnualTotals;
use crate::series::{Dataset, Series};

/// Hours in a non-leap year, used to pro-rate annual totals.
const HOURS_PER_YEAR: f64 = 365.0 * 24.0;

/// Parameters of one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    /// First simulated hour.
    pub start: NaiveDateTime,
    /// Number of hourly readings per city.
    pub num_hours: usize,
    /// Shared daily shape.
    pub profile: DiurnalProfile,
    /// Standard deviation of the constant per-city offset (kWh).
    pub city_offset_stddev: f64,
    /// Standard deviation of the independent hourly noise (kWh).
    pub noise_stddev: f64,
    /// Master random seed.
    pub seed: u64,
}

impl SimulationParams {
    /// Creates parameters with the default profile except for its daily
    /// amplitude.
    pub fn new(
        start: NaiveDateTime,
        num_hours: usize,
        daily_amplitude: f64,
        noise_stddev: f64,
        seed: u64,
    ) -> Self {
        Self {
            start,
            num_hours,
            profile: DiurnalProfile {
                daily_amplitude,
                ..DiurnalProfile::default()
            },
            city_offset_stddev: 5.0,
            noise_stddev,
            seed,
        }
    }
}

/// Generates per-city hourly series from a shared diurnal profile.
#[derive(Debug, Clone)]
pub struct Simulator {
    params: SimulationParams,
}

impl Simulator {
    pub fn new(params: SimulationParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Generates one series per distinct city.
    ///
    /// A single RNG seeded from `params.seed` is consumed city by city, first
    /// for the city offset and then for each hour's noise, so the same seed and
    /// city list always yield the same dataset. Cities with an entry in
    /// `totals` are rescaled so the window's sum matches their pro-rated
    /// annual consumption.
    pub fn generate<S: AsRef<str>>(&self, cities: &[S], totals: &AnnualTotals) -> Dataset {
        let p = &self.params;
        let mut rng = StdRng::seed_from_u64(p.seed);
        let mut seen: Vec<&str> = Vec::with_capacity(cities.len());
        let mut series = Vec::with_capacity(cities.len());

        for city in cities {
            let city = city.as_ref();
            if seen.contains(&city) {
                warn!(city, "skipping repeated city in simulation input");
                continue;
            }
            seen.push(city);

            let offset = gaussian_noise(&mut rng, p.city_offset_stddev);
            let mut values = Vec::with_capacity(p.num_hours);
            let mut clock = HourClock::new(p.start, p.num_hours);
            clock.run(|_, ts| {
                let shape = p.profile.value_at(f64::from(ts.hour()));
                let kwh = shape + offset + gaussian_noise(&mut rng, p.noise_stddev);
                values.push(kwh.max(0.0));
            });

            if let Some(annual_kwh) = totals.annual_kwh(city) {
                let target = annual_kwh * p.num_hours as f64 / HOURS_PER_YEAR;
                scale_to_total(&mut values, target);
                debug!(city, annual_kwh, target, "scaled series to annual total");
            }

            series.push(Series::new(city, p.start, values));
        }

        let dataset = Dataset::from_unique(series);
        info!(
            cities = dataset.len(),
            rows = dataset.row_count(),
            seed = p.seed,
            start = %p.start,
            "generated synthetic consumption"
        );
        dataset
    }
}

/// Simulates `cities` without annual-total scaling.
pub fn generate<S: AsRef<str>>(cities: &[S], params: &SimulationParams) -> Dataset {
    Simulator::new(params.clone()).generate(cities, &AnnualTotals::default())
}

/// Multiplies `values` so they sum to `target`; no-op for non-positive sums.
fn scale_to_total(values: &mut [f64], target: f64) {
    let sum: f64 = values.iter().sum();
    if sum > 0.0 && target > 0.0 {
        let factor = target / sum;
        values.iter_mut().for_each(|v| *v *= factor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    #[test]
    fn same_seed_is_deterministic() {
        let params = SimulationParams::new(start(), 48, 20.0, 3.0, 7);
        let a = generate(&["Ankara", "Izmir"], &params);
        let b = generate(&["Ankara", "Izmir"], &params);
        assert_eq!(a, b);
    }

    #[test]
    fn different_seed_changes_values() {
        let a = generate(&["Ankara"], &SimulationParams::new(start(), 24, 20.0, 3.0, 1));
        let b = generate(&["Ankara"], &SimulationParams::new(start(), 24, 20.0, 3.0, 2));
        assert_ne!(a, b);
    }

    #[test]
    fn repeated_city_is_skipped() {
        let params = SimulationParams::new(start(), 24, 20.0, 3.0, 42);
        let dataset = generate(&["Adana", "Adana", "Konya"], &params);
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn noiseless_run_follows_profile() {
        let mut params = SimulationParams::new(start(), 24, 20.0, 0.0, 42);
        params.city_offset_stddev = 0.0;
        let dataset = generate(&["Kayseri"], &params);
        let series = &dataset.series()[0];
        for (i, v) in series.values().iter().enumerate() {
            assert!((v - params.profile.value_at(i as f64)).abs() < 1e-9);
        }
    }

    #[test]
    fn annual_totals_rescale_window_sum() {
        let params = SimulationParams::new(start(), 168, 20.0, 3.0, 42);
        let totals = AnnualTotals::from_pairs([("Antalya", 8_760_000.0)]);
        let dataset = Simulator::new(params).generate(&["Antalya", "Mersin"], &totals);
        let antalya: f64 = dataset.series()[0].values().iter().sum();
        assert!((antalya - 168_000.0).abs() < 1e-6);
        let mersin: f64 = dataset.series()[1].values().iter().sum();
        assert!(mersin < 168.0 * 200.0);
    }

    #[test]
    fn values_are_never_negative() {
        let mut params = SimulationParams::new(start(), 72, 20.0, 500.0, 3);
        params.profile.base_kwh = 1.0;
        let dataset = generate(&["Van"], &params);
        assert!(dataset.series()[0].values().iter().all(|v| *v >= 0.0));
    }
}
