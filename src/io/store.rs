//! Flat-file persistence for simulated readings.
//!
//! One row per (city, hour) with header `city,timestamp,consumption`, cities
//! in dataset order and hours ascending. Consumption uses Rust's shortest
//! round-trip float formatting, so a written dataset reads back identically.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{debug, info};

use crate::series::{Dataset, Reading, SeriesError};

/// Column header of the persisted readings file.
pub const HEADER: [&str; 3] = ["city", "timestamp", "consumption"];

/// Timestamp layout used in every CSV this crate writes.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Failures reading or writing flat files.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The file does not exist.
    #[error("data file `{}` does not exist", path.display())]
    Missing { path: PathBuf },
    /// The file exists but could not be opened, created or renamed.
    #[error("cannot access `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The CSV layer failed (malformed quoting, I/O during parsing).
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    /// A row is syntactically valid CSV but not a valid reading.
    #[error("corrupt data at line {line}: {message}")]
    Corrupt { line: u64, message: String },
    /// Readings parse but violate the hourly-series invariant.
    #[error("inconsistent readings: {0}")]
    Series(#[from] SeriesError),
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Writes a dataset as CSV to any writer.
///
/// # Errors
///
/// Returns a [`StoreError`] if writing fails.
pub fn write_dataset(dataset: &Dataset, writer: impl Write) -> Result<(), StoreError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER)?;

    for r in dataset.readings() {
        wtr.write_record(&[
            r.city,
            r.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            r.consumption.to_string(),
        ])?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Writes a dataset to `path`, replacing any previous file.
///
/// Parent directories are created as needed. The data is written to a
/// sibling temporary file first and renamed over the target, so readers never
/// observe a half-written file.
///
/// # Errors
///
/// Returns a [`StoreError`] if any filesystem operation fails.
pub fn save_dataset(dataset: &Dataset, path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let tmp = temp_path(path);
    let file = File::create(&tmp).map_err(|e| StoreError::io(&tmp, e))?;
    let result = write_dataset(dataset, BufWriter::new(file));
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StoreError::io(path, e)
    })?;

    info!(
        path = %path.display(),
        rows = dataset.row_count(),
        "wrote consumption data"
    );
    Ok(())
}

/// Parses a dataset from CSV.
///
/// # Errors
///
/// Returns [`StoreError::Corrupt`] on a wrong header, empty content or an
/// unparseable row, and [`StoreError::Series`] when a city's hours have gaps
/// or duplicates.
pub fn read_dataset(reader: impl Read) -> Result<Dataset, StoreError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.iter().ne(HEADER) {
        return Err(StoreError::Corrupt {
            line: 1,
            message: format!(
                "expected header `{}`, found `{}`",
                HEADER.join(","),
                headers.iter().collect::<Vec<_>>().join(",")
            ),
        });
    }

    let mut readings = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        readings.push(parse_reading(&record, line)?);
    }

    if readings.is_empty() {
        return Err(StoreError::Corrupt {
            line: 2,
            message: "file contains no readings".to_string(),
        });
    }

    let dataset = Dataset::from_readings(readings)?;
    debug!(
        cities = dataset.len(),
        rows = dataset.row_count(),
        "parsed consumption data"
    );
    Ok(dataset)
}

/// Loads a dataset from `path`.
///
/// # Errors
///
/// Returns [`StoreError::Missing`] if the file does not exist, otherwise the
/// errors of [`read_dataset`].
pub fn load_dataset(path: &Path) -> Result<Dataset, StoreError> {
    if !path.exists() {
        return Err(StoreError::Missing {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    read_dataset(io::BufReader::new(file))
}

/// Returns `true` when `reference` exists and was modified after `data`.
///
/// Used to notice annual totals that changed after the data was generated.
pub fn is_stale(data: &Path, reference: &Path) -> bool {
    let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified()).ok();
    match (modified(data), modified(reference)) {
        (Some(data_time), Some(ref_time)) => ref_time > data_time,
        _ => false,
    }
}

fn parse_reading(record: &csv::StringRecord, line: u64) -> Result<Reading, StoreError> {
    let corrupt = |message: String| StoreError::Corrupt { line, message };

    let city = record
        .get(0)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| corrupt("missing city".to_string()))?;
    let raw_ts = record
        .get(1)
        .ok_or_else(|| corrupt("missing timestamp".to_string()))?;
    let timestamp = NaiveDateTime::parse_from_str(raw_ts, TIMESTAMP_FORMAT)
        .map_err(|e| corrupt(format!("invalid timestamp `{raw_ts}`: {e}")))?;
    let raw_value = record
        .get(2)
        .ok_or_else(|| corrupt("missing consumption".to_string()))?;
    let consumption = raw_value
        .parse::<f64>()
        .map_err(|e| corrupt(format!("invalid consumption `{raw_value}`: {e}")))?;

    Ok(Reading {
        city: city.to_string(),
        timestamp,
        consumption,
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Series;
    use chrono::NaiveDate;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    fn sample() -> Dataset {
        Dataset::new(vec![
            Series::new("Istanbul", start(), vec![101.25, 0.1 + 0.2, 1e-7]),
            Series::new("Ankara", start(), vec![99.0, 98.5, 97.125]),
        ])
        .unwrap()
    }

    #[test]
    fn header_and_row_count() {
        let mut buf = Vec::new();
        write_dataset(&sample(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "city,timestamp,consumption");
        assert_eq!(lines[1], "Istanbul,2024-01-01T00:00:00,101.25");
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn round_trip_is_exact() {
        let dataset = sample();
        let mut buf = Vec::new();
        write_dataset(&dataset, &mut buf).unwrap();
        let back = read_dataset(buf.as_slice()).unwrap();
        assert_eq!(back, dataset);
        assert_eq!(
            back.readings().collect::<Vec<_>>(),
            dataset.readings().collect::<Vec<_>>()
        );
    }

    #[test]
    fn wrong_header_is_corrupt() {
        let err = read_dataset("town,ts,kwh\nA,2024-01-01T00:00:00,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { line: 1, .. }));
    }

    #[test]
    fn bad_number_is_corrupt() {
        let csv = "city,timestamp,consumption\nA,2024-01-01T00:00:00,lots\n";
        let err = read_dataset(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { line: 2, .. }), "{err}");
    }

    #[test]
    fn empty_body_is_corrupt() {
        let err = read_dataset("city,timestamp,consumption\n".as_bytes()).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn gap_is_reported() {
        let csv = "city,timestamp,consumption\n\
                   A,2024-01-01T00:00:00,1\n\
                   A,2024-01-01T02:00:00,1\n";
        let err = read_dataset(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, StoreError::Series(SeriesError::Gap { .. })));
    }

    #[test]
    fn save_overwrites_and_load_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("consumption.csv");

        save_dataset(&sample(), &path).unwrap();
        let smaller = Dataset::new(vec![Series::new("Izmir", start(), vec![5.0])]).unwrap();
        save_dataset(&smaller, &path).unwrap();

        assert_eq!(load_dataset(&path).unwrap(), smaller);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_dataset(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, StoreError::Missing { .. }));
    }
}
