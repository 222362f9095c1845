//! Optional annual consumption totals used to scale simulated cities.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use super::store::StoreError;
use crate::catalog::normalize_name;

/// Annual consumption per city (kWh), keyed by normalized city name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnualTotals {
    by_name: HashMap<String, f64>,
}

impl AnnualTotals {
    /// Builds totals from `(city, kWh)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self {
            by_name: pairs
                .into_iter()
                .map(|(name, kwh)| (normalize_name(name), kwh))
                .collect(),
        }
    }

    /// Annual total for `city`, if known and positive.
    pub fn annual_kwh(&self, city: &str) -> Option<f64> {
        self.by_name
            .get(&normalize_name(city))
            .copied()
            .filter(|kwh| *kwh > 0.0)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Loads totals from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Missing`] if the file does not exist, or an I/O
    /// or CSV error if it cannot be read.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::Missing {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let totals = Self::read(file)?;
        info!(path = %path.display(), cities = totals.len(), "loaded annual totals");
        Ok(totals)
    }

    /// Reads totals from CSV.
    ///
    /// The first column is the city name and the second the yearly total in
    /// MWh, whatever the header says. Dots are treated as thousands
    /// separators. Rows whose value does not parse are skipped.
    ///
    /// # Errors
    ///
    /// Returns a CSV error if the input is not well-formed CSV.
    pub fn read(reader: impl Read) -> Result<Self, StoreError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut by_name = HashMap::new();
        for record in rdr.records() {
            let record = record?;
            let (Some(name), Some(raw)) = (record.get(0), record.get(1)) else {
                continue;
            };
            match raw.replace('.', "").parse::<f64>() {
                Ok(mwh) => {
                    by_name.insert(normalize_name(name), mwh * 1000.0);
                }
                Err(_) => debug!(city = name, value = raw, "skipping unparseable total"),
            }
        }
        Ok(Self { by_name })
    }
}
