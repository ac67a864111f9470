//! CSV loader for historical readings.
//!
//! Expects `City`, `Date` and `AQI` columns; any other column is ignored.

use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use crate::{AqiReading, HistoricalReadings, HistoryError};

/// Slash dates are read month-first; day-first is only tried when the first
/// field cannot be a month.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Loads readings from a CSV file.
///
/// # Errors
///
/// Returns [`HistoryError::Io`] if the file cannot be opened,
/// [`HistoryError::Csv`] for malformed CSV, or
/// [`HistoryError::MissingColumn`] if a required column is absent.
pub fn load_csv(path: &Path) -> Result<HistoricalReadings, HistoryError> {
    let file = std::fs::File::open(path)?;
    let history = read_csv(file)?;
    log::info!(
        "Loaded {} historical readings for {} cities from {}",
        history.len(),
        history.cities().len(),
        path.display()
    );
    Ok(history)
}

/// Reads readings from any CSV source.
///
/// Unparseable dates and AQI values become missing rather than failing the
/// load.
///
/// # Errors
///
/// See [`load_csv`].
pub fn read_csv<R: Read>(reader: R) -> Result<HistoricalReadings, HistoryError> {
    let mut reader = ::csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(HistoryError::MissingColumn(name))
    };
    let city_col = column("City")?;
    let date_col = column("Date")?;
    let aqi_col = column("AQI")?;

    let mut readings = Vec::new();
    let mut bad_dates = 0usize;

    for result in reader.records() {
        let record = result?;
        let Some(city) = record.get(city_col).map(str::trim).filter(|c| !c.is_empty()) else {
            continue;
        };
        let date = record.get(date_col).and_then(parse_date);
        if date.is_none() {
            bad_dates += 1;
        }
        let aqi = record
            .get(aqi_col)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite());

        readings.push(AqiReading::new(city, date, aqi));
    }

    if bad_dates > 0 {
        log::warn!("{bad_dates} historical readings have a missing or unparseable date");
    }

    Ok(HistoricalReadings::new(readings))
}

/// Parses a date in any of the accepted formats, discarding a time part.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}
