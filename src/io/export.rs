//! CSV export for forecast points.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use super::store::{StoreError, TIMESTAMP_FORMAT};
use crate::series::ForecastPoint;

/// Column header of the forecast download.
pub const HEADER: [&str; 5] = [
    "city",
    "timestamp",
    "predicted_consumption",
    "lower_bound",
    "upper_bound",
];

/// Exports one city's forecast to a CSV file at `path`.
///
/// # Errors
///
/// Returns a [`StoreError`] if file creation or writing fails.
pub fn export_forecast_csv(
    city: &str,
    points: &[ForecastPoint],
    path: &Path,
) -> Result<(), StoreError> {
    let file = File::create(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_forecast_csv(city, points, io::BufWriter::new(file))
}

/// Writes one city's forecast as CSV to any writer.
///
/// Output is deterministic for identical inputs; numbers carry four decimals.
///
/// # Errors
///
/// Returns a [`StoreError`] if writing fails.
pub fn write_forecast_csv(
    city: &str,
    points: &[ForecastPoint],
    writer: impl Write,
) -> Result<(), StoreError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER)?;

    for p in points {
        wtr.write_record(&[
            city.to_string(),
            p.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.4}", p.predicted_consumption),
            format!("{:.4}", p.lower_bound),
            format!("{:.4}", p.upper_bound),
        ])?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Download file name for a city's forecast.
pub fn forecast_file_name(city: &str) -> String {
    let slug: String = city
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{slug}_forecast.csv")
}
