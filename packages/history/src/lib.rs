#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Historical AQI readings and monthly aggregation per city.
//!
//! Readings are loaded once (see [`csv::load_csv`]) into an immutable
//! [`HistoricalReadings`] that request handlers share.

pub mod csv;

use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike as _, NaiveDate};
use serde::Serialize;

pub use csv::{load_csv, read_csv};

/// Errors loading or aggregating historical readings.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// No reading exists for the city.
    #[error("City not found")]
    CityNotFound(String),

    /// The city has readings but none carries both an AQI and a date.
    #[error("No data available for the selected city")]
    NoData(String),

    /// The source file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source is not valid CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    /// A required column is absent from the header.
    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),
}

/// One timestamped AQI observation.
#[derive(Debug, Clone, PartialEq)]
pub struct AqiReading {
    /// City name, as written in the source.
    pub city: String,
    /// Observation date, if it could be parsed.
    pub date: Option<NaiveDate>,
    /// Observed AQI, if present and numeric.
    pub aqi: Option<f64>,
}

impl AqiReading {
    /// Creates a reading.
    #[must_use]
    pub fn new(city: impl Into<String>, date: Option<NaiveDate>, aqi: Option<f64>) -> Self {
        Self {
            city: city.into(),
            date,
            aqi,
        }
    }
}

/// Mean AQI of one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAqi {
    /// Month formatted as `YYYY-MM`.
    pub month: String,
    /// Mean of the month's non-missing readings.
    pub aqi: f64,
}

/// An immutable collection of historical readings.
#[derive(Debug, Clone, Default)]
pub struct HistoricalReadings {
    readings: Vec<AqiReading>,
}

impl HistoricalReadings {
    /// Wraps a set of readings.
    #[must_use]
    pub const fn new(readings: Vec<AqiReading>) -> Self {
        Self { readings }
    }

    /// Number of readings held.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.readings.len()
    }

    /// Whether there are no readings.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Distinct city names in order of first appearance.
    #[must_use]
    pub fn cities(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.readings
            .iter()
            .map(|r| r.city.as_str())
            .filter(|city| seen.insert(*city))
            .collect()
    }

    /// Mean AQI per calendar month for `city`, in ascending month order.
    ///
    /// Missing readings are excluded rather than imputed.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::CityNotFound`] if `city` has no readings, or
    /// [`HistoryError::NoData`] if none of its readings has both an AQI
    /// and a date.
    pub fn monthly_average(&self, city: &str) -> Result<Vec<MonthlyAqi>, HistoryError> {
        let mut found = false;
        let mut months: BTreeMap<(i32, u32), (f64, u32)> = BTreeMap::new();

        for reading in self.readings.iter().filter(|r| r.city == city) {
            found = true;
            let (Some(date), Some(aqi)) = (reading.date, reading.aqi) else {
                continue;
            };
            if !aqi.is_finite() {
                continue;
            }
            let entry = months.entry((date.year(), date.month())).or_default();
            entry.0 += aqi;
            entry.1 += 1;
        }

        if !found {
            return Err(HistoryError::CityNotFound(city.to_owned()));
        }
        if months.is_empty() {
            return Err(HistoryError::NoData(city.to_owned()));
        }

        Ok(months
            .into_iter()
            .map(|((year, month), (sum, count))| MonthlyAqi {
                month: format!("{year:04}-{month:02}"),
                aqi: sum / f64::from(count),
            })
            .collect())
    }
}

impl FromIterator<AqiReading> for HistoricalReadings {
    fn from_iter<I: IntoIterator<Item = AqiReading>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
